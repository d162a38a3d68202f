//! # Passkey Registration Logic
//!
//! Server side of creating a new passkey. Registration is a two-step process:
//! start and finish.
//!
//! ## Registration Flow
//! 1. **Start**: get-or-create the user, ask the engine for a challenge, keep
//!    the challenge state under a fresh session token
//! 2. **Finish**: take the session out of the store, verify the credential,
//!    attach it to the user
//!
//! The session is removed before the engine runs, so a registration token is
//! good for exactly one finish attempt whatever its outcome.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::models::{SessionData, SessionKind};
use crate::store::sessions::generate_session_token;
use crate::webauthn::types::CeremonyStart;
use serde_json::Value;

/// Start the passkey registration process
///
/// ## Errors
/// - Ceremony: the engine could not produce a challenge (no session is issued)
/// - EntropySource: no session token could be generated
pub async fn begin_registration(state: &AppState, username: &str) -> AppResult<CeremonyStart> {
    tracing::info!(user = %username, "begin registration");

    let user = state.users.get_or_create(username).await;

    let challenge = state
        .engine
        .begin_registration(&user)
        .map_err(|e| AppError::ceremony("begin registration", e))?;

    let token = generate_session_token()?;
    state
        .sessions
        .save(
            &token,
            SessionData::ceremony(
                SessionKind::Registration,
                user.handle.clone(),
                challenge.state,
                state.config.ceremony_ttl(),
            ),
        )
        .await;

    Ok(CeremonyStart {
        options: challenge.options,
        token,
    })
}

/// Finish the passkey registration process
///
/// ## Errors
/// - SessionNotFound: missing, unknown, expired or non-registration token
/// - UserNotFound: the session points at a user that does not exist
/// - Ceremony: the engine rejected the attestation
pub async fn finish_registration(
    state: &AppState,
    token: Option<&str>,
    response: &Value,
) -> AppResult<()> {
    let token = token.ok_or(AppError::SessionNotFound)?;

    // One-shot: the entry is gone from here on, whatever happens next
    let session = state
        .sessions
        .take(token)
        .await
        .filter(|session| session.kind == SessionKind::Registration)
        .ok_or(AppError::SessionNotFound)?;

    let user = state
        .users
        .find_by_handle(&session.user_handle)
        .await
        .ok_or(AppError::UserNotFound)?;

    let credential = state
        .engine
        .finish_registration(&user, &session.challenge, response)
        .map_err(|e| AppError::ceremony("finish registration", e))?;

    state
        .users
        .update(&user.handle, |stored| stored.add_credential(credential))
        .await
        .ok_or(AppError::UserNotFound)?;

    tracing::info!(user = %user.name, "finish registration");
    Ok(())
}
