//! Error types for the worklog resolution engine.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model invocation failed: {0}")]
    Invocation(String),

    #[error("Model invocation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Model response is not valid JSON: {0}")]
    ResponseFormat(String),

    #[error("Entry {index} rejected: {reason}")]
    EntryValidation { index: usize, reason: String },

    #[error("Candidate directory error: {0}")]
    Candidates(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from talking to the generative model.
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            Error::Invocation(_) | Error::Timeout(_) | Error::ResponseFormat(_) | Error::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_seconds() {
        let err = Error::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Model invocation timed out after 30s");
        assert!(err.is_invocation_failure());
    }

    #[test]
    fn test_entry_validation_message() {
        let err = Error::EntryValidation {
            index: 2,
            reason: "entry is not an object".into(),
        };
        assert_eq!(err.to_string(), "Entry 2 rejected: entry is not an object");
        assert!(!err.is_invocation_failure());
    }
}
