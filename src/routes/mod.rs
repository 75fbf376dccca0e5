// Route exports
pub mod chats;
pub mod matches;
pub mod profiles;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};
use crate::core::{ConversationBackend, ConversationGate, Matcher, SendOutcome};
use crate::error::GateError;
use crate::models::{Conversation, ConversationView, ErrorResponse, ProfileField, SendMessageRequest, SendMessageResponse};
use crate::services::{ChatSessions, MatchStore, Moderator, PersistedConversations, ProfileStore, SessionStore, Verdict};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub matches: Arc<dyn MatchStore>,
    pub conversations: Arc<PersistedConversations>,
    pub chats: Arc<ChatSessions>,
    pub pending_inputs: Arc<SessionStore<ProfileField>>,
    pub moderator: Arc<Moderator>,
    pub matcher: Matcher,
    pub gate: ConversationGate,
}

impl AppState {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        matches: Arc<dyn MatchStore>,
        moderator: Moderator,
        matcher: Matcher,
        gate: ConversationGate,
    ) -> Self {
        Self {
            conversations: Arc::new(PersistedConversations::new(Arc::clone(&matches))),
            profiles,
            matches,
            chats: Arc::new(ChatSessions::new()),
            pending_inputs: Arc::new(SessionStore::new()),
            moderator: Arc::new(moderator),
            matcher,
            gate,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(profiles::configure)
            .configure(chats::configure),
    );
}

/// JSON error envelope with the given status
pub(crate) fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn validation_failed(errors: ValidationErrors) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string())
}

pub(crate) fn store_failure(context: &str, err: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("{}: {}", context, err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, context, err.to_string())
}

/// Gate state from `user_id`'s side of the conversation
pub(crate) fn conversation_view(gate: &ConversationGate, conversation: &Conversation, user_id: &str) -> ConversationView {
    let partner_id = conversation.partner_of(user_id).unwrap_or_default().to_string();
    ConversationView {
        your_messages: conversation.count_for(user_id),
        their_messages: conversation.count_for(&partner_id),
        remaining_messages: gate.remaining_for(conversation, user_id),
        can_send: gate.can_send(conversation, user_id),
        status: conversation.status,
        partner_id,
    }
}

/// Moderate a message, run it through the gate and report where to deliver it
pub(crate) async fn relay_message<B>(state: &AppState, backend: &B, req: &SendMessageRequest) -> HttpResponse
where
    B: ConversationBackend + ?Sized,
{
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    // Blocked text never reaches the gate, so it does not use up the budget
    let warning = match state.moderator.check(&req.text) {
        Verdict::Block(message) => {
            tracing::info!("Blocked message from {}", req.user_id);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Message blocked", message);
        }
        Verdict::Warn(message) => Some(message),
        Verdict::Allow => None,
    };

    match state.gate.send_through(backend, &req.user_id).await {
        Ok(SendOutcome::Allowed(conversation)) => {
            let deliver_to = conversation
                .partner_of(&req.user_id)
                .unwrap_or_default()
                .to_string();

            tracing::info!("Relaying message from {} to {}", req.user_id, deliver_to);

            HttpResponse::Ok().json(SendMessageResponse {
                deliver_to,
                text: req.text.clone(),
                status: conversation.status,
                remaining_messages: state.gate.remaining_for(&conversation, &req.user_id),
                warning,
            })
        }
        Ok(SendOutcome::RateLimited { cap, .. }) => error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limited",
            format!(
                "You've reached the limit of {} messages. Wait for a reply from your study buddy!",
                cap
            ),
        ),
        Ok(SendOutcome::NoConversation) => error_response(
            StatusCode::NOT_FOUND,
            "No active conversation",
            format!("User {} has no active conversation", req.user_id),
        ),
        Err(GateError::NotParticipant(user_id)) => error_response(
            StatusCode::FORBIDDEN,
            "Not a participant",
            format!("User {} is not part of this conversation", user_id),
        ),
        Err(GateError::Store(e)) => store_failure("Failed to update conversation", e),
    }
}
