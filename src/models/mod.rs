// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BestMatch, Conversation, ConversationStatus, Gender, MatchPairing, Medium, NewPairing,
    Profile, ProfileField, ScoreBreakdown, ScoringWeights,
};
pub use requests::{
    BlockUserRequest, FindMatchRequest, PromptRequest, SendMessageRequest, StartChatRequest,
    TextInputRequest, UpdateProfileRequest,
};
pub use responses::{
    ConversationView, ErrorResponse, FindMatchResponse, HealthResponse, MatchStatusResponse,
    MatchSummary, ProfileResponse, PromptResponse, SendMessageResponse,
};
