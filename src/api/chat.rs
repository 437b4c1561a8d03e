use crate::api::auth::error_response;
use crate::database::MongoDB;
use crate::services::llm_service;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    pub user_input: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    pub user_message: String,
    pub assistant_response: String,
}

#[utoipa::path(
    post,
    path = "/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Empty user input"),
        (status = 500, description = "Error generating response")
    )
)]
pub async fn chat(db: web::Data<MongoDB>, request: web::Json<ChatRequest>) -> HttpResponse {
    let user_text = request.user_input.trim();

    if user_text.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "User input cannot be empty."
        }));
    }

    log::info!("💬 POST /chat - input: {} chars", user_text.len());

    match llm_service::run_chat(&db, user_text).await {
        Ok(assistant_response) => HttpResponse::Ok().json(ChatResponse {
            user_message: user_text.to_string(),
            assistant_response,
        }),
        Err(e) => {
            log::error!("❌ Chat failed: {}", e);
            error_response(&e)
        }
    }
}
