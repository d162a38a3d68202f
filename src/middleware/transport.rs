//! Session token transport: cookies and the `Session-Key` header.
//!
//! Every issued token goes out twice, as an `HttpOnly` cookie and as a
//! `Session-Key` response header, so both cookie-based browsers and script
//! clients that echo the header back can finish a ceremony. On the way in a
//! `Session-Key` request header wins over the cookie.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderName, HeaderValue,
};

pub static SESSION_KEY_HEADER: HeaderName = HeaderName::from_static("session-key");

/// Which token a cookie carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSlot {
    /// Correlates a begin step with its finish step
    Ceremony,
    /// Marks a browser as logged in
    LoggedIn,
}

impl TokenSlot {
    pub fn cookie_name(self) -> &'static str {
        match self {
            TokenSlot::Ceremony => "ceremony_sid",
            TokenSlot::LoggedIn => "sid",
        }
    }

    /// Ceremony cookies are only sent back to the ceremony endpoints
    pub fn path(self) -> &'static str {
        match self {
            TokenSlot::Ceremony => "/api/passkey",
            TokenSlot::LoggedIn => "/",
        }
    }
}

/// Build a secure `HttpOnly` cookie for a session token.
pub fn session_cookie(
    slot: TokenSlot,
    token: &str,
    max_age_secs: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={token}; Path={}; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}",
        slot.cookie_name(),
        slot.path()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(slot: TokenSlot, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    session_cookie(slot, "", 0, secure)
}

/// Add the cookie and the `Session-Key` header for a freshly issued token
pub fn attach_session_token(
    headers: &mut HeaderMap,
    slot: TokenSlot,
    token: &str,
    max_age_secs: i64,
    secure: bool,
) -> Result<(), InvalidHeaderValue> {
    headers.append(SET_COOKIE, session_cookie(slot, token, max_age_secs, secure)?);
    headers.insert(SESSION_KEY_HEADER.clone(), HeaderValue::from_str(token)?);
    Ok(())
}

/// Tell the browser to drop the cookie for `slot`
pub fn clear_session_token(headers: &mut HeaderMap, slot: TokenSlot, secure: bool) {
    // Cookie name, path and flags are all static ASCII
    if let Ok(cookie) = clear_session_cookie(slot, secure) {
        headers.append(SET_COOKIE, cookie);
    }
}

/// Find the session token a request presents for `slot`
pub fn extract_session_token(headers: &HeaderMap, slot: TokenSlot) -> Option<String> {
    if let Some(token) = extract_session_key(headers) {
        return Some(token);
    }

    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            let val = val.trim();
            if key.trim() == slot.cookie_name() && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_session_key(headers: &HeaderMap) -> Option<String> {
    let token = headers.get(&SESSION_KEY_HEADER)?.to_str().ok()?.trim();
    if token.is_empty() || token == "null" {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceremony_cookie_is_scoped_and_locked_down() {
        let cookie = session_cookie(TokenSlot::Ceremony, "abc", 300, true).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "ceremony_sid=abc; Path=/api/passkey; HttpOnly; SameSite=Lax; Max-Age=300; Secure"
        );
    }

    #[test]
    fn insecure_cookie_omits_secure_flag() {
        let cookie = session_cookie(TokenSlot::LoggedIn, "abc", 60, false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "sid=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
    }

    #[test]
    fn attach_sets_cookie_and_header() {
        let mut headers = HeaderMap::new();
        attach_session_token(&mut headers, TokenSlot::Ceremony, "tok", 300, true).unwrap();

        assert_eq!(headers.get(&SESSION_KEY_HEADER).unwrap(), "tok");
        assert!(headers
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("ceremony_sid=tok;"));
    }

    #[test]
    fn clear_expires_the_cookie() {
        let mut headers = HeaderMap::new();
        clear_session_token(&mut headers, TokenSlot::LoggedIn, true);
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("sid=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn session_key_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("ceremony_sid=from-cookie"));
        headers.insert(SESSION_KEY_HEADER.clone(), HeaderValue::from_static("from-header"));

        assert_eq!(
            extract_session_token(&headers, TokenSlot::Ceremony).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn cookie_is_read_by_slot_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; broken; sid=logged; ceremony_sid=cer"),
        );

        assert_eq!(
            extract_session_token(&headers, TokenSlot::LoggedIn).as_deref(),
            Some("logged")
        );
        assert_eq!(
            extract_session_token(&headers, TokenSlot::Ceremony).as_deref(),
            Some("cer")
        );
    }

    #[test]
    fn missing_or_empty_tokens_are_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers, TokenSlot::LoggedIn), None);

        headers.insert(COOKIE, HeaderValue::from_static("sid="));
        headers.insert(SESSION_KEY_HEADER.clone(), HeaderValue::from_static("null"));
        assert_eq!(extract_session_token(&headers, TokenSlot::LoggedIn), None);
    }
}
