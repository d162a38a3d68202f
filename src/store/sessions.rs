//! # Session Store
//!
//! In-memory, time-bounded storage of ceremony and logged-in sessions keyed by
//! an unguessable token.
//!
//! ## Expiry
//! Readers never hand out an entry whose deadline has passed, whether or not
//! the background sweeper has purged it yet. The sweeper only reclaims memory.
//!
//! ## One-shot finish steps
//! Finish steps use [`SessionStore::take`], which removes the entry and returns
//! it in one locked operation. Two requests racing on the same token therefore
//! see exactly one `Some`.

use crate::error::{AppError, AppResult};
use crate::store::models::SessionData;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Raw token length in bytes (256 bits)
const SESSION_TOKEN_BYTES: usize = 32;

/// Create a new session token
///
/// 32 bytes from the operating system CSPRNG, base64url encoded without
/// padding (43 characters). There is no fallback source: if the OS generator
/// fails the request fails.
pub fn generate_session_token() -> AppResult<String> {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(AppError::EntropySource)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Shared session map
///
/// Cloning is cheap: all clones point at the same map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionData>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the session for `token`
    pub async fn save(&self, token: &str, data: SessionData) {
        tracing::debug!(kind = ?data.kind, expires_at = %data.expires_at, "saving session");
        self.sessions.lock().await.insert(token.to_string(), data);
    }

    /// Look up a live session
    ///
    /// `None` means unknown, already consumed or expired.
    pub async fn get(&self, token: &str) -> Option<SessionData> {
        let now = Utc::now();
        let sessions = self.sessions.lock().await;
        sessions
            .get(token)
            .filter(|session| !session.is_expired_at(now))
            .cloned()
    }

    /// Remove the session for `token` and return it if it was still live
    ///
    /// Expired entries are removed as well but reported as `None`.
    pub async fn take(&self, token: &str) -> Option<SessionData> {
        let now = Utc::now();
        let removed = self.sessions.lock().await.remove(token);
        removed.filter(|session| !session.is_expired_at(now))
    }

    /// Remove the session for `token`; no-op if it is absent
    pub async fn delete(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }

    /// Drop every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Periodically purge expired sessions
///
/// Runs forever; spawn it on the runtime at startup.
pub async fn run_sweeper(store: SessionStore, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let removed = store.purge_expired().await;
        if removed > 0 {
            tracing::debug!("Session sweeper removed {} expired sessions", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::SessionKind;
    use std::collections::HashSet;

    fn ceremony(ttl: chrono::Duration) -> SessionData {
        SessionData::ceremony(
            SessionKind::Registration,
            b"alice".to_vec(),
            b"challenge".to_vec(),
            ttl,
        )
    }

    #[test]
    fn generated_tokens_carry_256_bits() {
        let token = generate_session_token().unwrap();
        assert_eq!(token.len(), 43);
        let decoded = URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(decoded.len(), SESSION_TOKEN_BYTES);
    }

    #[test]
    fn generated_tokens_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generate_session_token().unwrap()));
        }
    }

    #[tokio::test]
    async fn get_returns_saved_session() {
        let store = SessionStore::new();
        let data = ceremony(chrono::Duration::minutes(5));
        store.save("t1", data.clone()).await;

        assert_eq!(store.get("t1").await, Some(data));
        assert_eq!(store.get("t2").await, None);
    }

    #[tokio::test]
    async fn expired_session_is_invisible_before_sweeping() {
        let store = SessionStore::new();
        store.save("old", ceremony(chrono::Duration::seconds(-1))).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("old").await, None);
        assert_eq!(store.take("old").await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn take_is_one_shot() {
        let store = SessionStore::new();
        store.save("t1", ceremony(chrono::Duration::minutes(5))).await;

        assert!(store.take("t1").await.is_some());
        assert!(store.take("t1").await.is_none());
        assert!(store.get("t1").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_takes_have_a_single_winner() {
        let store = SessionStore::new();
        store.save("t1", ceremony(chrono::Duration::minutes(5))).await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take("t1").await.is_some() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = SessionStore::new();
        store.save("t1", ceremony(chrono::Duration::minutes(5))).await;

        store.delete("t1").await;
        store.delete("t1").await;
        assert!(store.get("t1").await.is_none());
    }

    #[tokio::test]
    async fn purge_expired_keeps_live_sessions() {
        let store = SessionStore::new();
        store.save("live", ceremony(chrono::Duration::minutes(5))).await;
        store.save("dead", ceremony(chrono::Duration::seconds(-5))).await;

        assert_eq!(store.purge_expired().await, 1);
        assert!(store.get("live").await.is_some());
        assert_eq!(store.len().await, 1);
    }
}
