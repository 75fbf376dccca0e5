use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;
use crate::error::StoreError;
use crate::models::{SendMessageRequest, StartChatRequest};
use crate::routes::{conversation_view, error_response, relay_message, store_failure, validation_failed, AppState};

/// Configure ephemeral chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/chats/start", web::post().to(start_chat))
        .route("/chats/message", web::post().to(send_message))
        .route("/chats/{user_id}", web::get().to(chat_status))
        .route("/chats/{user_id}/end", web::post().to(end_chat));
}

/// Open a chat between two users
///
/// POST /api/v1/chats/start
///
/// Any chat either user was already in is ended first. Chats live only in
/// process memory.
async fn start_chat(
    state: web::Data<AppState>,
    req: web::Json<StartChatRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    match state.chats.start(&req.user_id, &req.other_user_id).await {
        Ok(conversation) => {
            tracing::info!("Chat started between {} and {}", req.user_id, req.other_user_id);
            HttpResponse::Ok().json(conversation_view(&state.gate, &conversation, &req.user_id))
        }
        Err(StoreError::Conflict(message)) => {
            error_response(StatusCode::BAD_REQUEST, "Invalid chat", message)
        }
        Err(e) => store_failure("Failed to start chat", e),
    }
}

/// POST /api/v1/chats/message
async fn send_message(
    state: web::Data<AppState>,
    req: web::Json<SendMessageRequest>,
) -> impl Responder {
    relay_message(&state, state.chats.as_ref(), &req).await
}

/// GET /api/v1/chats/{user_id}
async fn chat_status(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match state.chats.get(&user_id).await {
        Some(conversation) => {
            HttpResponse::Ok().json(conversation_view(&state.gate, &conversation, &user_id))
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            "No active chat",
            format!("User {} is not in a chat", user_id),
        ),
    }
}

/// End the user's chat for both members
///
/// POST /api/v1/chats/{user_id}/end
async fn end_chat(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match state.chats.end(&user_id).await {
        Some(conversation) => {
            tracing::info!("Chat ended by {}", user_id);
            HttpResponse::Ok().json(conversation_view(&state.gate, &conversation, &user_id))
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            "No active chat",
            format!("User {} is not in a chat", user_id),
        ),
    }
}
