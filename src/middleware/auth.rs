use crate::middleware::transport::{extract_session_token, TokenSlot};
use crate::state::AppState;
use crate::store::models::{SessionData, SessionKind};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// The logged-in session that let a request through the gate
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionData);

/// Only let requests with a live logged-in session through
///
/// Anything else (no token, unknown token, expired token, ceremony token)
/// is sent back to the entry page with `303 See Other`. The session's
/// lifetime is never extended here.
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match extract_session_token(request.headers(), TokenSlot::LoggedIn) {
        Some(token) => state.sessions.get(&token).await,
        None => None,
    };

    match session {
        Some(session) if session.kind == SessionKind::LoggedIn => {
            request.extensions_mut().insert(CurrentSession(session));
            next.run(request).await
        }
        _ => Redirect::to("/").into_response(),
    }
}
