use thiserror::Error;

/// Errors raised by profile and pairing storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Errors raised while looking for a study partner
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Profile is incomplete, missing: {}", missing.join(", "))]
    InvalidProfile { missing: Vec<&'static str> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the conversation gate
///
/// A rate-limited send is not an error; see `SendDecision::RateLimited`.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("User {0} is not part of this conversation")]
    NotParticipant(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Profile field validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Inappropriate(String),

    #[error("\"{0}\" doesn't look like a real module code. Please use format like CS2030S, ST2334, MA1101R.")]
    InvalidModuleCode(String),

    #[error("Please enter at least one module.")]
    NoModules,

    #[error("Please write at least {min} characters describing your study style.")]
    DescriptionTooShort { min: usize },

    #[error("Please enter a real major name (e.g., Computer Science, Business, Engineering).")]
    UnknownMajor(String),

    #[error("{0} cannot be empty.")]
    Empty(&'static str),

    #[error("Year of study must be between 1 and 5, got {0}")]
    YearOutOfRange(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_profile_lists_missing_fields() {
        let err = MatchError::InvalidProfile {
            missing: vec!["Gender", "Modules"],
        };
        assert_eq!(err.to_string(), "Profile is incomplete, missing: Gender, Modules");
    }
}
