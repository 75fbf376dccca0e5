use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{Gender, Medium, ProfileField};

/// Request to find a study partner
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Request to relay a message to the sender's partner
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1, max = 4096))]
    pub text: String,
}

/// Request to open an ephemeral chat between two matched users
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartChatRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "other_user_id", rename = "otherUserId")]
    pub other_user_id: String,
}

/// Partial profile update, absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    pub gender: Option<Gender>,
    #[validate(range(min = 1, max = 5))]
    #[serde(alias = "year_of_study", rename = "yearOfStudy")]
    pub year_of_study: Option<u8>,
    pub major: Option<String>,
    pub modules: Option<Vec<String>>,
    pub mediums: Option<Vec<Medium>>,
    pub description: Option<String>,
    pub name: Option<String>,
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockUserRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "target_user_id", rename = "targetUserId")]
    pub target_user_id: String,
}

/// Start collecting a profile field from the next free-text input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub field: ProfileField,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TextInputRequest {
    #[validate(length(min = 1))]
    pub text: String,
}
