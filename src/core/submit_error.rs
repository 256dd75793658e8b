use crate::core::validation::FieldErrors;
use thiserror::Error;

pub const GENERIC_PERSISTENCE_MESSAGE: &str = "Saving failed. Please try again.";
pub const UNEXPECTED_FAILURE_MESSAGE: &str = "Unexpected error. Please try again shortly.";

/// Why a submission attempt did not reach (or was refused by) the lead store.
///
/// The `Display` text is what the visitor sees. The honeypot variant deliberately
/// reads like a generic protection message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Submission was blocked by automatic protection. Please try again.")]
    AbuseSuspected,

    #[error("Submission limit reached. Please try again in {seconds_left} seconds.")]
    RateLimited { seconds_left: i64 },

    #[error("Fill in all required fields to continue ({0}).")]
    ValidationFailed(FieldErrors),

    #[error("Business ID is not a valid UUID.")]
    InvalidBusinessIdentifier,

    #[error("{reason}")]
    PersistenceFailed { reason: String },

    #[error("A submission is already in progress.")]
    Busy,
}

impl SubmitError {
    /// Terminal errors move the form into the error display state.
    pub fn is_terminal(&self) -> bool {
        match self {
            SubmitError::AbuseSuspected
            | SubmitError::RateLimited { .. }
            | SubmitError::InvalidBusinessIdentifier
            | SubmitError::PersistenceFailed { .. } => true,
            SubmitError::ValidationFailed(_) | SubmitError::Busy => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_contains_seconds() {
        let err = SubmitError::RateLimited { seconds_left: 7 };
        assert_eq!(
            err.to_string(),
            "Submission limit reached. Please try again in 7 seconds."
        );
        assert!(err.is_terminal());
    }

    #[test]
    fn test_abuse_message_does_not_mention_honeypot() {
        let message = SubmitError::AbuseSuspected.to_string().to_lowercase();
        assert!(!message.contains("honeypot"));
        assert!(!message.contains("hidden"));
    }

    #[test]
    fn test_validation_is_advisory() {
        assert!(!SubmitError::ValidationFailed(FieldErrors::default()).is_terminal());
        assert!(!SubmitError::Busy.is_terminal());
    }
}
