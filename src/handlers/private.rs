//! # Protected Page
//!
//! Only reachable through the `require_login` gate.

use crate::middleware::auth::CurrentSession;
use crate::state::AppState;
use axum::extract::{Extension, State};

/// Greet the logged-in user
///
/// ## Route
/// GET /private
pub async fn private_page(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> String {
    let name = state
        .users
        .find_by_handle(&session.user_handle)
        .await
        .map(|user| user.display_name)
        .unwrap_or_else(|| "World".to_string());

    format!("Hello, {name}!")
}
