//! Error types for katalog-core

use thiserror::Error;

/// Result type alias using katalog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by local concerns: configuration, the session store, IO.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable session store error
    #[error("Session store error: {0}")]
    Store(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for remote gateway calls.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Failure of a single remote call.
///
/// The three variants are never collapsed: callers react differently to each.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The service could not be reached (connect failure, timeout, broken body stream).
    #[error("Service unreachable: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("{message} ({status})")]
    Application { status: u16, message: String },

    /// The service answered 2xx but the body did not match the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Only transport failures are worth a user-initiated retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Message suitable for showing verbatim to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Cannot reach the catalog service. Try again.".to_string(),
            Self::Application { message, .. } => message.clone(),
            Self::Decode(_) => "The catalog service sent an unexpected response.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_is_retryable() {
        assert!(FetchError::Transport("timeout".to_string()).is_retryable());
        assert!(!FetchError::Decode("bad".to_string()).is_retryable());
        assert!(!FetchError::Application {
            status: 400,
            message: "Judul wajib diisi".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn application_message_is_surfaced_verbatim() {
        let error = FetchError::Application {
            status: 409,
            message: "Buku sudah ada".to_string(),
        };
        assert_eq!(error.user_message(), "Buku sudah ada");
        assert_eq!(error.to_string(), "Buku sudah ada (409)");
    }
}
