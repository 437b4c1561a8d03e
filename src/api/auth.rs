use crate::services::auth_service::{
    self, AuthResponse, LoginRequest, RegisterRequest, ResetPasswordRequest, ResetPasswordResponse,
};
use crate::database::MongoDB;
use crate::utils::AppError;
use actix_web::{web, HttpRequest, HttpResponse};

/// Maps a service error onto the HTTP status the auth contract promises:
/// 400 invalid request, 401 bad credentials, 404 unknown email, 409 duplicate
/// email. Internal failures become a 500 with a generic body.
pub(crate) fn error_response(e: &AppError) -> HttpResponse {
    let body = serde_json::json!({
        "success": false,
        "error": e.client_message()
    });

    match e {
        AppError::InvalidRequest(_) => HttpResponse::BadRequest().json(body),
        AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(body),
        AppError::NotFound(_) => HttpResponse::NotFound().json(body),
        AppError::Conflict(_) => HttpResponse::Conflict().json(body),
        AppError::DatabaseError(_) | AppError::LlmError(_) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    log::info!("📝 POST /register - email: {}", request.email);

    match auth_service::register(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", request.email);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.email, e);
            error_response(&e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid password or API key"),
        (status = 404, description = "Email not found")
    )
)]
pub async fn login(db: web::Data<MongoDB>, request: web::Json<LoginRequest>) -> HttpResponse {
    log::info!("🔐 POST /login - email: {}", request.email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            error_response(&e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ResetPasswordResponse),
        (status = 404, description = "Email not found")
    )
)]
pub async fn reset_password(
    db: web::Data<MongoDB>,
    request: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /reset-password - email: {}", request.email);

    match auth_service::reset_password(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Password reset: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Password reset failed: {} - {}", request.email, e);
            error_response(&e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid"),
        (status = 401, description = "Invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(req: HttpRequest) -> HttpResponse {
    log::info!("✓ GET /verify");

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "No valid Authorization header"
            }));
        }
    };

    match auth_service::verify_token(token) {
        Ok(claims) => {
            log::info!("✅ Token valid for user: {}", claims.sub);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "valid": true,
                "user_id": claims.sub,
                "email": claims.email,
                "name": claims.name,
                "exp": claims.exp
            }))
        }
        Err(e) => {
            log::warn!("❌ Invalid token: {}", e);
            HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "valid": false,
                "error": "Invalid or expired token"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;

    fn status_of(e: AppError) -> StatusCode {
        error_response(&e).status()
    }

    #[test]
    fn test_error_response_status_mapping() {
        assert_eq!(
            status_of(AppError::InvalidRequest("Invalid email address".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Unauthorized("Invalid password".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::NotFound("Email not found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Conflict("Email already registered".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::DatabaseError("connection reset".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::LlmError("upstream 503".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_response_body_shapes() {
        // Domain errors keep their message in the envelope
        let resp = error_response(&AppError::Conflict("Email already registered".to_string()));
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Email already registered");

        // Internal errors collapse to the generic message
        let resp = error_response(&AppError::DatabaseError(
            "mongodb://internal-host refused".to_string(),
        ));
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Internal server error");
    }
}
