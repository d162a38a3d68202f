//! # webauthn-rs Ceremony Engine
//!
//! Production [`CeremonyEngine`] backed by `webauthn-rs` passkeys.
//!
//! ## What gets stored where?
//! - The `PasskeyRegistration` / `PasskeyAuthentication` state is serialized
//!   to JSON bytes and travels through the session store as challenge state.
//! - The whole `Passkey` is serialized into [`Credential::public_key`]; it
//!   holds the public key, the counter and the other metadata webauthn-rs
//!   needs to verify later logins.
//!
//! ## Security Note
//! The private key NEVER leaves the user's device. We only store the public key
//! which is useless without the corresponding private key.

use crate::config::Config;
use crate::store::models::{Credential, PasskeyUser};
use crate::webauthn::engine::{counter_regressed, CeremonyEngine, CeremonyError, Challenge};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use uuid::Uuid;
use webauthn_rs::prelude::*;

/// Namespace for deriving WebAuthn user UUIDs from user handles
const USER_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_4a0e_93d2_4b8e_a5f7_2d0c_9e3b_1a47);

/// webauthn-rs wants a UUID per user; derive a stable one from the handle so
/// the same login name always presents the same user id to authenticators.
fn user_uuid(handle: &[u8]) -> Uuid {
    Uuid::new_v5(&USER_ID_NAMESPACE, handle)
}

/// Signature counter the authenticator reported when the passkey was created
fn registered_counter(passkey: &Passkey) -> u32 {
    webauthn_rs::prelude::Credential::from(passkey.clone()).counter
}

pub struct WebauthnEngine {
    webauthn: Webauthn,
}

impl WebauthnEngine {
    /// Configure WebAuthn with relying party information
    ///
    /// The first configured origin is the primary one; the rest are appended
    /// as additional allowed origins.
    ///
    /// # Errors
    /// Returns an error if no origin is configured, an origin is not a valid
    /// URL, or webauthn-rs rejects the RP ID/origin combination.
    pub fn new(config: &Config) -> Result<Self> {
        let (primary, extra) = config
            .rp_origins
            .split_first()
            .ok_or_else(|| anyhow!("at least one relying-party origin is required"))?;

        let rp_origin =
            Url::parse(primary).with_context(|| format!("Invalid RP origin: {primary}"))?;
        let mut builder =
            WebauthnBuilder::new(&config.rp_id, &rp_origin)?.rp_name(&config.rp_name);
        for origin in extra {
            let url = Url::parse(origin).with_context(|| format!("Invalid RP origin: {origin}"))?;
            builder = builder.append_allowed_origin(&url);
        }

        Ok(Self {
            webauthn: builder.build()?,
        })
    }
}

impl CeremonyEngine for WebauthnEngine {
    fn begin_registration(&self, user: &dyn PasskeyUser) -> Result<Challenge, CeremonyError> {
        // Existing passkeys are excluded so the same authenticator is not
        // registered twice for one user
        let exclude: Vec<CredentialID> = user
            .credentials()
            .iter()
            .map(|credential| credential.id.clone().into())
            .collect();
        let exclude = if exclude.is_empty() { None } else { Some(exclude) };

        let (ccr, reg_state) = self.webauthn.start_passkey_registration(
            user_uuid(user.handle()),
            user.name(),
            user.display_name(),
            exclude,
        )?;

        Ok(Challenge {
            options: serde_json::to_value(&ccr)?,
            state: serde_json::to_vec(&reg_state)?,
        })
    }

    fn finish_registration(
        &self,
        _user: &dyn PasskeyUser,
        state: &[u8],
        response: &Value,
    ) -> Result<Credential, CeremonyError> {
        let reg_state: PasskeyRegistration = serde_json::from_slice(state)?;
        let reg_credential: RegisterPublicKeyCredential =
            serde_json::from_value(response.clone())?;

        // Checks the challenge, the signature, RP ID and origin
        let passkey = self
            .webauthn
            .finish_passkey_registration(&reg_credential, &reg_state)?;

        // Seed the counter so the very first login is already clone-checked
        Ok(Credential {
            id: passkey.cred_id().as_slice().to_vec(),
            public_key: serde_json::to_vec(&passkey)?,
            sign_count: registered_counter(&passkey),
            clone_warning: false,
        })
    }

    fn begin_login(&self, user: &dyn PasskeyUser) -> Result<Challenge, CeremonyError> {
        if user.credentials().is_empty() {
            return Err(CeremonyError::Rejected(format!(
                "No passkeys found for user '{}'",
                user.name()
            )));
        }

        let passkeys = user
            .credentials()
            .iter()
            .map(|credential| serde_json::from_slice::<Passkey>(&credential.public_key))
            .collect::<Result<Vec<_>, _>>()?;

        let (rcr, auth_state) = self.webauthn.start_passkey_authentication(&passkeys)?;

        Ok(Challenge {
            options: serde_json::to_value(&rcr)?,
            state: serde_json::to_vec(&auth_state)?,
        })
    }

    fn finish_login(
        &self,
        user: &dyn PasskeyUser,
        state: &[u8],
        response: &Value,
    ) -> Result<Credential, CeremonyError> {
        let auth_state: PasskeyAuthentication = serde_json::from_slice(state)?;
        let auth_credential: PublicKeyCredential = serde_json::from_value(response.clone())?;

        let result = self
            .webauthn
            .finish_passkey_authentication(&auth_credential, &auth_state)?;

        let stored = user
            .credentials()
            .iter()
            .find(|credential| credential.id == result.cred_id().as_slice())
            .ok_or_else(|| {
                CeremonyError::Rejected("Credential is not registered to this user".to_string())
            })?;

        let mut passkey: Passkey = serde_json::from_slice(&stored.public_key)?;
        passkey.update_credential(&result);

        Ok(Credential {
            id: stored.id.clone(),
            public_key: serde_json::to_vec(&passkey)?,
            sign_count: result.counter(),
            clone_warning: counter_regressed(stored.sign_count, result.counter()),
        })
    }
}
