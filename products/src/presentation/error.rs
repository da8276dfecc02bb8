//! Classification of fetch failures.
//!
//! The screens present two kinds of failure: domain errors (the backend
//! refused) and transport errors (the backend is unreachable). Anything else
//! is a programming fault and must escape the screen instead of becoming a
//! state.

use crate::domain::error::RepositoryError;
use thiserror::Error;

/// Presentable failure kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Recoverable failure reported by the backend
    Domain,
    /// Recoverable failure reaching the backend
    Transport,
}

/// A failure the screen knows how to present
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedError {
    /// Kind of failure
    pub kind: ErrorKind,
    /// Description shown to the user
    pub message: String,
}

/// A failure outside the presentable taxonomy
#[derive(Error, Debug)]
#[error("unclassified failure: {source}")]
pub struct UnclassifiedError {
    #[source]
    source: anyhow::Error,
}

/// Classify a repository failure
///
/// # Errors
///
/// Returns [`UnclassifiedError`] for failures that are neither domain nor
/// transport errors.
pub fn classify(error: RepositoryError) -> Result<ClassifiedError, UnclassifiedError> {
    match error {
        RepositoryError::Domain { message } => Ok(ClassifiedError {
            kind: ErrorKind::Domain,
            message,
        }),
        RepositoryError::Transport { message } => Ok(ClassifiedError {
            kind: ErrorKind::Transport,
            message,
        }),
        RepositoryError::Unexpected(source) => Err(UnclassifiedError { source }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn domain_and_transport_keep_message() {
        assert_eq!(
            classify(RepositoryError::domain("Invalid query")).unwrap(),
            ClassifiedError {
                kind: ErrorKind::Domain,
                message: "Invalid query".into()
            }
        );
        assert_eq!(
            classify(RepositoryError::transport("No connection")).unwrap().kind,
            ErrorKind::Transport
        );
    }

    #[test]
    fn unexpected_is_unclassified() {
        let error = classify(RepositoryError::Unexpected(anyhow::anyhow!("bad json"))).unwrap_err();
        assert_eq!(error.to_string(), "unclassified failure: bad json");
    }
}
