//! Unified error handling for the engine.
//!
//! Provides a unified `EngineError` type wrapping the per-boundary errors
//! (API, storage, validation). The engine never panics on an external
//! failure: background work degrades to "keep the previous snapshot", and
//! only user-initiated actions surface an error at all, through
//! [`EngineError::user_message`].

use thiserror::Error;

use upgrow_core::EmailError;

use crate::api::ApiError;
use crate::store::StoreError;

/// Application-level error type for the panel engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Backend API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Persisted store operation failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// An email address failed validation before it reached the backend.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The operation requires an active session.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Authentication flow failed outside the backend contract.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// An order intent failed local validation.
    #[error("Invalid order intent: {0}")]
    InvalidIntent(String),
}

impl EngineError {
    /// Message safe to show to the user.
    ///
    /// Backend-provided rejection details are surfaced verbatim (the
    /// backend already phrases them for end users); transport and storage
    /// internals are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Rejected { detail, .. }) => detail.clone(),
            Self::Api(ApiError::Unavailable) => {
                "The service is temporarily unavailable, please try again later".to_owned()
            }
            Self::Api(_) => "Network error, please try again".to_owned(),
            Self::Store(_) => "Could not access local storage".to_owned(),
            Self::InvalidEmail(e) => e.to_string(),
            Self::NotAuthenticated => "Please log in first".to_owned(),
            Self::Auth(msg) | Self::InvalidIntent(msg) => msg.clone(),
        }
    }
}

/// Result type alias for `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;
