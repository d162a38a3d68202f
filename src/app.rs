//! # Router
//!
//! Wires the handlers, the login gate and the static file fallback into one
//! axum `Router`. `main` serves it; the HTTP tests drive it directly.

use crate::handlers::auth::{
    login_finish, login_start, logout, register_finish, register_start, session_info,
};
use crate::handlers::health::health_check;
use crate::handlers::private::private_page;
use crate::middleware::{auth::require_login, transport::SESSION_KEY_HEADER};
use crate::state::AppState;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the application router around `state`
pub fn build_router(state: AppState) -> Router {
    // Only the configured relying-party origins may call the API from a
    // browser; script clients need to read `Session-Key` off the response
    let origins: Vec<HeaderValue> = state
        .config
        .rp_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, SESSION_KEY_HEADER.clone()])
        .expose_headers([SESSION_KEY_HEADER.clone()])
        .allow_credentials(true);

    // Routes behind the login gate
    let protected_routes = Router::new()
        .route("/private", get(private_page))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_login,
        ));

    Router::new()
        .route("/health", get(health_check))
        // Registration ceremony
        .route("/api/passkey/registerStart", post(register_start))
        .route("/api/passkey/registerFinish", post(register_finish))
        // Login ceremony
        .route("/api/passkey/loginStart", post(login_start))
        .route("/api/passkey/loginFinish", post(login_finish))
        // Logged-in session
        .route("/api/passkey/logout", post(logout))
        .route("/api/passkey/session", get(session_info))
        .merge(protected_routes)
        // Frontend (index.html, script.js, ...)
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
