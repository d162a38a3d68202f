//! # WebAuthn Module
//!
//! This module contains the passkey ceremony logic.
//!
//! ## Submodules
//! - `engine`: the `CeremonyEngine` boundary (challenge generation and response
//!   verification)
//! - `passkey`: the webauthn-rs implementation of that boundary
//! - `types`: request/result types for the API
//! - `registration`: creating new passkey credentials
//! - `authentication`: logging in with existing passkeys
//!
//! ## Ceremony Flow Overview
//!
//! ### Registration (Creating a Passkey)
//! 1. Client requests registration → `registration::begin_registration()`
//! 2. Server stores the challenge state under a new session token and sends
//!    the challenge plus the token to the client
//! 3. Client uses WebAuthn API to create credential with authenticator
//! 4. Client sends credential and token back → `registration::finish_registration()`
//! 5. Server consumes the token, verifies the credential and stores it
//!
//! ### Authentication (Logging In)
//! 1. Client requests login → `authentication::begin_login()`
//! 2. Server stores the challenge state under a new session token
//! 3. Client uses WebAuthn API to sign challenge with authenticator
//! 4. Client sends signed assertion and token back → `authentication::finish_login()`
//! 5. Server consumes the token and verifies the signature
//! 6. If valid, issue a new logged-in session token

pub mod authentication;
pub mod engine;
pub mod passkey;
pub mod registration;
pub mod types;
