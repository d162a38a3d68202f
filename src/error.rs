//! # Error Handling
//!
//! This module defines the application error type and how it turns into an
//! HTTP response.
//!
//! ## Error taxonomy
//! - **BadRequest**: malformed request body, missing username (400)
//! - **Ceremony**: the ceremony engine rejected a begin or finish step (400)
//! - **SessionNotFound**: the finish step presented an unknown, consumed,
//!   expired or mismatched session token (400)
//! - **UserNotFound**: login was attempted for an unknown user (404)
//! - **CloneDetected**: the clone policy rejected a login (403)
//! - **EntropySource**: the OS random source failed while minting a token (500)
//!
//! Every variant renders as `{ "error": "..." }`. Details that could leak
//! session or credential material are only written to the log.

use crate::webauthn::engine::CeremonyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
///
/// Handlers and orchestration functions return `AppResult<T>`; axum converts
/// the error half into a response through the `IntoResponse` impl below, so a
/// failed request never takes the process down with it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Client sent something we cannot use
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The ceremony engine refused the step
    ///
    /// `action` is the client-facing description ("begin registration",
    /// "finish login", ...). The engine's own message stays in `source`.
    #[error("can't {action}")]
    Ceremony {
        action: &'static str,
        #[source]
        source: CeremonyError,
    },

    /// No usable session for the presented token
    #[error("Session not found")]
    SessionNotFound,

    /// No user with the requested login name
    #[error("User not found")]
    UserNotFound,

    /// Login refused because the authenticator looks cloned
    #[error("Login rejected: possible cloned authenticator")]
    CloneDetected,

    /// The OS random number generator failed
    #[error("Entropy source unavailable: {0}")]
    EntropySource(#[source] rand::Error),

    /// Unexpected errors that shouldn't normally occur
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn ceremony(action: &'static str, source: CeremonyError) -> Self {
        AppError::Ceremony { action, source }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Ceremony { .. } | AppError::SessionNotFound => {
                StatusCode::BAD_REQUEST
            }
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::CloneDetected => StatusCode::FORBIDDEN,
            AppError::EntropySource(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::Ceremony { action, source } => {
                // Engine messages can name origins, challenges or credential IDs
                tracing::warn!("can't {}: {}", action, source);
                self.to_string()
            }
            AppError::EntropySource(e) => {
                tracing::error!("Entropy source error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
