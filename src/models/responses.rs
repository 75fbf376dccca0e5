use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::domain::{ConversationStatus, Profile, ProfileField, ScoreBreakdown};

/// Match surfaced to the requester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "pairingId")]
    pub pairing_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    #[serde(rename = "sharedModules")]
    pub shared_modules: Vec<String>,
    pub profile: Profile,
}

/// Response for find match endpoint
///
/// `match` is null when nobody qualifies or the best score is too weak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchResponse {
    #[serde(rename = "match")]
    pub best_match: Option<MatchSummary>,
    #[serde(rename = "candidatesConsidered")]
    pub candidates_considered: usize,
}

/// Gate state as seen by one member of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationView {
    #[serde(rename = "partnerId")]
    pub partner_id: String,
    pub status: ConversationStatus,
    #[serde(rename = "yourMessages")]
    pub your_messages: u32,
    #[serde(rename = "theirMessages")]
    pub their_messages: u32,
    /// `None` once the conversation is active
    #[serde(rename = "remainingMessages")]
    pub remaining_messages: Option<u32>,
    #[serde(rename = "canSend")]
    pub can_send: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStatusResponse {
    #[serde(rename = "pairingId")]
    pub pairing_id: Uuid,
    pub score: f64,
    #[serde(flatten)]
    pub conversation: ConversationView,
}

/// A message accepted by the gate, to be delivered by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    #[serde(rename = "deliverTo")]
    pub deliver_to: String,
    pub text: String,
    pub status: ConversationStatus,
    #[serde(rename = "remainingMessages")]
    pub remaining_messages: Option<u32>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub profile: Profile,
    #[serde(rename = "missingFields")]
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub awaiting: ProfileField,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
