//! Study Buddy Match - study partner matching and conversation gating
//!
//! Scores opted-in student profiles against each other, records a pairing for
//! the strongest candidate, and throttles the first messages of every pairing
//! until both sides have spoken.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{score_pair, ConversationGate, Matcher, SendDecision, SendOutcome};
pub use error::{GateError, MatchError, StoreError, ValidationError};
pub use models::{BestMatch, Conversation, ConversationStatus, MatchPairing, Profile, ScoringWeights};
