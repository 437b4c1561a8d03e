use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MediChat Service API",
        version = "1.0.0",
        description = "Backend for the MediBot medical-information chat assistant.\n\n**Authentication:** register/login issue a short-lived JWT; the login endpoint additionally requires an `x-api-key` header when the gate is configured.\n\n**Features:**\n- Email/password authentication with bcrypt hashing\n- Password reset\n- LLM-backed chat with medicine lookup tools\n- Health monitoring"
    ),
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::reset_password,
        crate::api::auth::verify_token,
        crate::api::chat::chat,
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::ResetPasswordRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::AuthData,
            crate::services::auth_service::ResetPasswordResponse,
            crate::api::chat::ChatRequest,
            crate::api::chat::ChatResponse,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login, password reset, and token verification."),
        (name = "Chat", description = "Medical chat assistant backed by an LLM with medicine lookup tools."),
        (name = "Health", description = "Health check endpoint for monitoring service status.")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
