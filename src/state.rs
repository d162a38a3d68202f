//! # Application State
//!
//! This module defines the shared state that's accessible to all request handlers.
//! In Axum, state is how you share resources (stores, configuration, the
//! ceremony engine) across different parts of your application.
//!
//! ## The State Pattern
//! Instead of reaching for process-wide globals, we:
//! 1. Build the stores and the ceremony engine once at startup
//! 2. Put them in AppState
//! 3. Share it across all request handlers
//! 4. Axum clones the state for each request (cheap because everything inside is an Arc)

use crate::config::Config;
use crate::store::{sessions::SessionStore, users::UserStore};
use crate::webauthn::engine::CeremonyEngine;
use crate::webauthn::passkey::WebauthnEngine;
use anyhow::Result;
use std::sync::Arc;

/// Shared application state
///
/// ## Thread Safety
/// Both stores serialize access internally, and the engine is `Send + Sync`,
/// so the same state can be used from many request tasks at once.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Generates challenges and verifies signed responses
    pub engine: Arc<dyn CeremonyEngine>,

    /// In-flight ceremonies and logged-in sessions, keyed by token
    pub sessions: SessionStore,

    /// User records, keyed by login name
    pub users: UserStore,
}

impl AppState {
    /// Initialize application state with the webauthn-rs engine
    ///
    /// # Errors
    /// Returns an error if the WebAuthn configuration is invalid (e.g.,
    /// malformed origin URL).
    pub fn new(config: &Config) -> Result<Self> {
        let engine = WebauthnEngine::new(config)?;
        Ok(Self::with_engine(config.clone(), Arc::new(engine)))
    }

    /// Initialize application state around any ceremony engine
    pub fn with_engine(config: Config, engine: Arc<dyn CeremonyEngine>) -> Self {
        AppState {
            config: Arc::new(config),
            engine,
            sessions: SessionStore::new(),
            users: UserStore::new(),
        }
    }
}
