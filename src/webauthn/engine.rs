//! # Ceremony Engine Boundary
//!
//! The orchestrator never talks to `webauthn-rs` directly. It calls a
//! [`CeremonyEngine`], which produces challenges and verifies the signed
//! responses against the relying-party configuration. The production engine
//! is [`crate::webauthn::passkey::WebauthnEngine`]; tests plug in their own.
//!
//! ## Challenge state
//! A begin step returns the options for the browser plus an opaque byte
//! string. The orchestrator keeps those bytes in the session store and hands
//! them back, untouched, to the matching finish step.

use crate::store::models::{Credential, PasskeyUser};
use serde_json::Value;
use thiserror::Error;
use webauthn_rs::prelude::WebauthnError;

/// Output of a begin step
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Sent to the browser as-is (`{ "publicKey": { ... } }`)
    pub options: Value,
    /// Kept server-side until the finish step
    pub state: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum CeremonyError {
    /// WebAuthn protocol errors: bad signature, origin mismatch, invalid
    /// challenge and friends
    #[error("WebAuthn error: {0}")]
    Webauthn(#[from] WebauthnError),

    /// Challenge state or client response could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The engine refused the step for a reason of its own
    #[error("{0}")]
    Rejected(String),
}

/// The four ceremony steps
///
/// Implementations must be safe to share between request tasks.
pub trait CeremonyEngine: Send + Sync {
    fn begin_registration(&self, user: &dyn PasskeyUser) -> Result<Challenge, CeremonyError>;

    /// Verify an attestation and return the new credential
    fn finish_registration(
        &self,
        user: &dyn PasskeyUser,
        state: &[u8],
        response: &Value,
    ) -> Result<Credential, CeremonyError>;

    fn begin_login(&self, user: &dyn PasskeyUser) -> Result<Challenge, CeremonyError>;

    /// Verify an assertion and return the used credential with its new
    /// counter and clone flag
    fn finish_login(
        &self,
        user: &dyn PasskeyUser,
        state: &[u8],
        response: &Value,
    ) -> Result<Credential, CeremonyError>;
}

/// Signature counter check
///
/// Authenticators that implement a counter must report a strictly larger
/// value on every use. A counter that stands still or goes backwards means a
/// second copy of the key may exist. Two zero counters mean the authenticator
/// does not count at all, which is fine.
pub fn counter_regressed(stored: u32, reported: u32) -> bool {
    (stored > 0 || reported > 0) && reported <= stored
}
