//! # Store Models
//!
//! Value types kept by the in-memory stores:
//! - [`User`]: a login name and the passkeys registered to it
//! - [`Credential`]: one registered public-key credential
//! - [`SessionData`]: state correlating a begin step with its finish step,
//!   or marking a logged-in browser
//!
//! ## The `PasskeyUser` capability
//! The ceremony engine never sees the concrete [`User`] type. It works against
//! the [`PasskeyUser`] trait (handle, names, credential list), so any record
//! that can answer those questions can take part in a ceremony.

use chrono::{DateTime, Duration, Utc};

/// What the ceremony engine needs to know about a user
pub trait PasskeyUser {
    /// Opaque, unique user handle sent to authenticators
    fn handle(&self) -> &[u8];

    /// Login name
    fn name(&self) -> &str;

    /// Human-readable name shown by the authenticator
    fn display_name(&self) -> &str;

    /// Registered credentials, in registration order
    fn credentials(&self) -> &[Credential];
}

/// Passkey credential registered to a user
///
/// ## What is stored?
/// - **id**: Credential ID chosen by the authenticator
/// - **public_key**: Public key material. The webauthn adapter keeps the whole
///   serialized `Passkey` here.
/// - **sign_count**: Signature counter from the last successful login
/// - **clone_warning**: Set when the counter did not move forward, which
///   suggests the authenticator has been duplicated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: Vec<u8>,
    pub public_key: Vec<u8>,
    pub sign_count: u32,
    pub clone_warning: bool,
}

/// User account
///
/// Users are created the first time a login name shows up in a ceremony and
/// are never deleted. In this server the handle is simply the bytes of the
/// login name, so one name always maps to one handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub handle: Vec<u8>,
    pub name: String,
    pub display_name: String,
    credentials: Vec<Credential>,
}

impl User {
    /// Create a user with no credentials
    ///
    /// The handle is derived from the login name and the display name
    /// defaults to the login name.
    pub fn new(name: &str) -> Self {
        Self {
            handle: name.as_bytes().to_vec(),
            name: name.to_string(),
            display_name: name.to_string(),
            credentials: Vec::new(),
        }
    }

    /// Attach a freshly registered credential
    ///
    /// Credential IDs are unique per user: registering an ID that is already
    /// present replaces the old entry in place.
    pub fn add_credential(&mut self, credential: Credential) {
        match self.credentials.iter_mut().find(|c| c.id == credential.id) {
            Some(existing) => *existing = credential,
            None => self.credentials.push(credential),
        }
    }

    /// Replace the credential with the same ID
    ///
    /// Returns `false` and leaves the collection untouched when no credential
    /// matches.
    pub fn update_credential(&mut self, credential: Credential) -> bool {
        match self.credentials.iter_mut().find(|c| c.id == credential.id) {
            Some(existing) => {
                *existing = credential;
                true
            }
            None => false,
        }
    }
}

impl PasskeyUser for User {
    fn handle(&self) -> &[u8] {
        &self.handle
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn credentials(&self) -> &[Credential] {
        &self.credentials
    }
}

/// Which step a session token is good for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Issued by begin-registration, consumed by finish-registration
    Registration,
    /// Issued by begin-login, consumed by finish-login
    Login,
    /// Issued after a successful login, checked by the access gate
    LoggedIn,
}

/// Server-side session state
///
/// ## Lifecycle
/// 1. A begin step stores the engine's challenge state under a new token
/// 2. The client completes the ceremony and presents the token
/// 3. The finish step takes the entry out of the store (one-shot)
/// 4. A successful login stores a second, `LoggedIn` entry under a new token
///
/// An entry whose `expires_at` is at or before the current time is treated as
/// missing by every reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub kind: SessionKind,
    pub user_handle: Vec<u8>,
    /// Serialized challenge state from the ceremony engine; empty for
    /// logged-in sessions
    pub challenge: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    /// Session for an in-flight registration or login ceremony
    pub fn ceremony(
        kind: SessionKind,
        user_handle: Vec<u8>,
        challenge: Vec<u8>,
        ttl: Duration,
    ) -> Self {
        Self {
            kind,
            user_handle,
            challenge,
            expires_at: deadline(ttl),
        }
    }

    /// Marker session issued after a successful login
    pub fn logged_in(user_handle: Vec<u8>, ttl: Duration) -> Self {
        Self {
            kind: SessionKind::LoggedIn,
            user_handle,
            challenge: Vec::new(),
            expires_at: deadline(ttl),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// `now + ttl`, pinned to the latest representable instant on overflow
fn deadline(ttl: Duration) -> DateTime<Utc> {
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
