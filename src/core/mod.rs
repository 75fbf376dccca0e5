// Core algorithm exports
pub mod gate;
pub mod matcher;
pub mod scoring;
pub mod similarity;
pub mod text;

pub use gate::{ConversationBackend, ConversationGate, SendDecision, SendOutcome, DEFAULT_MESSAGE_CAP};
pub use matcher::{Matcher, DEFAULT_ACCEPTANCE_THRESHOLD};
pub use scoring::{calculate_match_score, score_pair};
pub use similarity::{jaccard, majors_match, medium_overlap, module_overlap, shared_modules};
pub use text::{cosine_similarity, keyword_boost, normalize, tokenize};
