//! # Middleware Module
//!
//! Middleware intercepts HTTP requests and responses.
//!
//! ## Our Middleware
//! - `auth`: gate for protected pages (needs a live logged-in session)
//! - `transport`: how session tokens travel (cookies and the `Session-Key`
//!   header), shared by the gate and the ceremony handlers

pub mod auth;
pub mod transport;
