//! # HTTP Request Handlers
//!
//! This module contains all the HTTP route handlers.
//!
//! ## Submodules
//! - `health`: Health check endpoint (for monitoring)
//! - `auth`: Ceremony endpoints (register, login) plus logout and session info
//! - `private`: The page behind the login gate
//!
//! ## Handler Pattern
//! Handlers are thin: they pull the JSON body and the session token out of
//! the request, call into `webauthn::registration` / `webauthn::authentication`,
//! and turn the outcome into a response with the right cookies and headers.

pub mod auth;
pub mod health;
pub mod private;
