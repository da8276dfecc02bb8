//! Failures raised by the repositories behind the screens.

use thiserror::Error;

/// Failures raised by repositories.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The backend rejected the request with a user-presentable reason.
    #[error("{message}")]
    Domain {
        /// Description shown to the user
        message: String,
    },

    /// The backend could not be reached.
    #[error("{message}")]
    Transport {
        /// Description shown to the user
        message: String,
    },

    /// Anything the repository could not attribute to the backend or the
    /// network (decoding bugs, broken invariants).
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl RepositoryError {
    /// Create a domain error
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
