use crate::error::{AppError, AppResult};
use crate::middleware::transport::{
    attach_session_token, clear_session_token, extract_session_token, TokenSlot,
};
use crate::state::AppState;
use crate::webauthn::types::{CeremonyStart, UsernameRequest};
use crate::webauthn::{authentication, registration};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Options as the JSON body, session token as cookie + `Session-Key`
fn ceremony_started(state: &AppState, start: CeremonyStart) -> AppResult<Response> {
    let mut headers = HeaderMap::new();
    attach_session_token(
        &mut headers,
        TokenSlot::Ceremony,
        &start.token,
        state.config.ceremony_ttl_secs,
        state.config.cookie_secure,
    )
    .map_err(|e| AppError::Internal(format!("Session header error: {}", e)))?;

    Ok((headers, Json(start.options)).into_response())
}

// Registration endpoints

pub async fn register_start(
    State(state): State<AppState>,
    payload: Result<Json<UsernameRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(req) = payload.map_err(bad_body)?;
    let start = registration::begin_registration(&state, req.login_name()?).await?;

    ceremony_started(&state, start)
}

pub async fn register_finish(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection).into_response(),
    };
    let token = extract_session_token(&headers, TokenSlot::Ceremony);

    let mut response = match registration::finish_registration(&state, token.as_deref(), &body).await
    {
        Ok(()) => Json("Registration Success").into_response(),
        Err(e) => e.into_response(),
    };

    // The registration session is spent either way
    clear_session_token(
        response.headers_mut(),
        TokenSlot::Ceremony,
        state.config.cookie_secure,
    );
    response
}

// Login endpoints

pub async fn login_start(
    State(state): State<AppState>,
    payload: Result<Json<UsernameRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(req) = payload.map_err(bad_body)?;
    let start = authentication::begin_login(&state, req.login_name()?).await?;

    ceremony_started(&state, start)
}

pub async fn login_finish(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection).into_response(),
    };
    let token = extract_session_token(&headers, TokenSlot::Ceremony);
    let secure = state.config.cookie_secure;

    let mut response = match authentication::finish_login(&state, token.as_deref(), &body).await {
        Ok(success) => {
            let mut response = Json("Login Success").into_response();
            if let Err(e) = attach_session_token(
                response.headers_mut(),
                TokenSlot::LoggedIn,
                &success.token,
                state.config.session_ttl_secs,
                secure,
            ) {
                state.sessions.delete(&success.token).await;
                return AppError::Internal(format!("Session header error: {}", e)).into_response();
            }
            response
        }
        Err(e) => e.into_response(),
    };

    clear_session_token(response.headers_mut(), TokenSlot::Ceremony, secure);
    response
}

// Session management

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = extract_session_token(&headers, TokenSlot::LoggedIn);
    authentication::logout(&state, token.as_deref()).await;

    // Always clear the cookie, even if the session was already gone
    let mut response = Json("Logged out").into_response();
    clear_session_token(
        response.headers_mut(),
        TokenSlot::LoggedIn,
        state.config.cookie_secure,
    );
    response
}

pub async fn session_info(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let token = extract_session_token(&headers, TokenSlot::LoggedIn);

    match authentication::logged_in_user(&state, token.as_deref()).await {
        Some(username) => Json(json!({
            "authenticated": true,
            "username": username
        })),
        None => Json(json!({
            "authenticated": false
        })),
    }
}
