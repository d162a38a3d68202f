//! # Passkey Session Server
//!
//! Passkey (WebAuthn) registration and login with server-side ceremony
//! sessions.
//!
//! ## Key Concepts
//! - **Ceremony**: a begin/finish challenge-response exchange, either to
//!   register a passkey or to log in with one
//! - **Session token**: unguessable key tying a begin step to its finish step,
//!   and later marking a browser as logged in
//! - **One-shot sessions**: a finish step consumes its token whatever the
//!   outcome, so a challenge can never be answered twice

pub mod app;        // Router construction
pub mod config;     // Configuration management (environment variables, settings)
pub mod error;      // Error handling and custom error types
pub mod handlers;   // HTTP request handlers (routes)
pub mod middleware; // Login gate and session token transport
pub mod state;      // Shared application state
pub mod store;      // In-memory users and sessions
pub mod webauthn;   // Ceremony orchestration and the webauthn-rs engine

pub use app::build_router;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
