use reqwest::StatusCode;
use thiserror::Error;

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A transport-level failure: connect, timeout, or body decode.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote store rejected the call with an error status.
    #[error("remote store returned {status}: {message}")]
    Rejected {
        /// The status the remote store answered with.
        status: StatusCode,
        /// The response body, as far as it could be read.
        message: String,
    },

    /// The client could not be constructed from the given settings.
    #[error("client configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether the remote store denied the call outright.
    ///
    /// Stores answer with a forbidden status when the provisioned throughput
    /// is exhausted, so callers may want to treat these rejections differently
    /// from transient failures.
    pub fn is_access_denied(&self) -> bool {
        match self {
            StoreError::Rejected { status, .. } => *status == StatusCode::FORBIDDEN,
            StoreError::Transport(err) => err.status() == Some(StatusCode::FORBIDDEN),
            StoreError::Configuration(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_forbidden_as_access_denied() {
        let err = StoreError::Rejected {
            status: StatusCode::FORBIDDEN,
            message: "request rate is large".into(),
        };
        assert!(err.is_access_denied());

        let err = StoreError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "oops".into(),
        };
        assert!(!err.is_access_denied());
    }
}
