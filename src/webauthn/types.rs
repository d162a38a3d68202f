//! # Passkey API Types
//!
//! Request bodies and results of the ceremony operations.
//!
//! ## API Flow
//! Each ceremony has two steps: start and finish
//! - Start: client sends a username, server answers with a challenge and a
//!   session token
//! - Finish: client sends the authenticator's response (as the raw JSON body)
//!   and presents the session token

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest accepted login name, in bytes
const MAX_USERNAME_LEN: usize = 64;

/// Request to start registration or login
///
/// ## Example JSON
/// ```json
/// {
///   "username": "alice"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

impl UsernameRequest {
    /// Trimmed login name; empty or oversized names are rejected
    pub fn login_name(&self) -> AppResult<&str> {
        let name = self.username.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("username is required".to_string()));
        }
        if name.len() > MAX_USERNAME_LEN {
            return Err(AppError::BadRequest(format!(
                "username must be at most {MAX_USERNAME_LEN} bytes"
            )));
        }
        Ok(name)
    }
}

/// Result of a begin step
#[derive(Debug)]
pub struct CeremonyStart {
    /// Challenge options for `navigator.credentials.create()` / `.get()`
    pub options: Value,
    /// Session token correlating this begin step with its finish step
    pub token: String,
}

/// Result of a successful login
#[derive(Debug)]
pub struct LoginSuccess {
    /// Logged-in session token; never equal to the consumed ceremony token
    pub token: String,
    pub username: String,
}
