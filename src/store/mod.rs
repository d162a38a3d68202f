//! # Store Module
//!
//! In-memory storage, split the same way the data is:
//! - `models`: User, Credential and SessionData value types
//! - `users`: keyed user records (get-or-create, upsert, lookup)
//! - `sessions`: token-keyed ceremony and logged-in sessions, token minting
//!   and the expiry sweeper
//!
//! Both stores are cheap-to-clone handles around an `Arc<Mutex<HashMap>>`,
//! shared by every request through `AppState`.

pub mod models;
pub mod sessions;
pub mod users;
