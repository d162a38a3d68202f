//! # Passkey Login Logic
//!
//! Server side of logging in with an existing passkey, plus the logged-in
//! session that a successful login hands out.

use crate::config::{ClonePolicy, UnknownUserPolicy};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::models::{SessionData, SessionKind};
use crate::store::sessions::generate_session_token;
use crate::webauthn::types::{CeremonyStart, LoginSuccess};
use serde_json::Value;

/// Start the passkey login process
///
/// Unknown login names follow the configured [`UnknownUserPolicy`]: either
/// fail right away, or create the user and let the engine fail on the empty
/// credential list.
pub async fn begin_login(state: &AppState, username: &str) -> AppResult<CeremonyStart> {
    tracing::info!(user = %username, "begin login");

    let user = match state.config.unknown_user_policy {
        UnknownUserPolicy::Reject => state
            .users
            .find_by_name(username)
            .await
            .ok_or(AppError::UserNotFound)?,
        UnknownUserPolicy::Create => state.users.get_or_create(username).await,
    };

    let challenge = state
        .engine
        .begin_login(&user)
        .map_err(|e| AppError::ceremony("begin login", e))?;

    let token = generate_session_token()?;
    state
        .sessions
        .save(
            &token,
            SessionData::ceremony(
                SessionKind::Login,
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

/// Finish the passkey login process
///
/// ## Flow
/// 1. Take the login session out of the store (fails closed)
/// 2. Verify the assertion with the engine
/// 3. Apply the clone policy
/// 4. Store the updated credential (new counter)
/// 5. Issue a new logged-in session under a new token
///
/// ## Errors
/// - SessionNotFound: missing, unknown, expired or non-login token
/// - Ceremony: the engine rejected the assertion
/// - CloneDetected: the counter regressed and the policy is `reject`
pub async fn finish_login(
    state: &AppState,
    token: Option<&str>,
    response: &Value,
) -> AppResult<LoginSuccess> {
    let token = token.ok_or(AppError::SessionNotFound)?;

    let session = state
        .sessions
        .take(token)
        .await
        .filter(|session| session.kind == SessionKind::Login)
        .ok_or(AppError::SessionNotFound)?;

    let user = state
        .users
        .find_by_handle(&session.user_handle)
        .await
        .ok_or(AppError::UserNotFound)?;

    let credential = state
        .engine
        .finish_login(&user, &session.challenge, response)
        .map_err(|e| AppError::ceremony("finish login", e))?;

    if credential.clone_warning {
        tracing::warn!(
            user = %user.name,
            sign_count = credential.sign_count,
            policy = ?state.config.clone_policy,
            "signature counter did not advance; authenticator may be cloned"
        );
        if state.config.clone_policy == ClonePolicy::Reject {
            return Err(AppError::CloneDetected);
        }
    }

    state
        .users
        .update(&user.handle, |stored| stored.update_credential(credential))
        .await
        .ok_or(AppError::UserNotFound)?;

    let logged_in_token = generate_session_token()?;
    state
        .sessions
        .save(
            &logged_in_token,
            SessionData::logged_in(user.handle.clone(), state.config.session_ttl()),
        )
        .await;

    tracing::info!(user = %user.name, "finish login");
    Ok(LoginSuccess {
        token: logged_in_token,
        username: user.name,
    })
}

/// End a logged-in session; unknown tokens are ignored
pub async fn logout(state: &AppState, token: Option<&str>) {
    if let Some(token) = token {
        state.sessions.delete(token).await;
    }
}

/// Resolve a logged-in session token to its user's login name
pub async fn logged_in_user(state: &AppState, token: Option<&str>) -> Option<String> {
    let session = state
        .sessions
        .get(token?)
        .await
        .filter(|session| session.kind == SessionKind::LoggedIn)?;
    state
        .users
        .find_by_handle(&session.user_handle)
        .await
        .map(|user| user.name)
}
