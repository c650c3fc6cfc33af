//! Crate-level error type.

use eathub_core::{EmailError, FeedbackError, OrderValidationError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::http::ApiError;

/// Errors returned by EatHub operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request failed (no response, error status, or bad body).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A local precondition failed; nothing was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The operation needs an authenticated session.
    #[error("Not signed in")]
    NotAuthenticated,
}

/// Result type alias for EatHub operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The underlying API error, if the failure came from a request.
    #[must_use]
    pub const fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Whether trying again later might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.api().is_some_and(ApiError::is_retryable)
    }
}

impl From<OrderValidationError> for Error {
    fn from(e: OrderValidationError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<FeedbackError> for Error {
    fn from(e: FeedbackError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<EmailError> for Error {
    fn from(e: EmailError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}
