//! # Configuration Management
//!
//! This module handles loading configuration from environment variables.
//! It uses the "12-factor app" methodology where configuration comes from the environment.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 8080)
//! - `RP_ID`: WebAuthn Relying Party ID (usually your domain)
//! - `RP_NAME`: Human-readable name for your service
//! - `RP_ORIGINS`: Comma-separated list of allowed origins (full URLs)
//! - `STATIC_DIR`: Directory served for everything outside the API
//! - `CEREMONY_TTL_SECS`: Lifetime of a begin/finish ceremony session
//! - `SESSION_TTL_SECS`: Lifetime of a logged-in session
//! - `SESSION_SWEEP_SECS`: How often expired sessions are purged
//!
//! The three durations must be between 1 second and [`MAX_DURATION_SECS`].
//! - `COOKIE_SECURE`: Mark session cookies `Secure`
//! - `UNKNOWN_USER_POLICY`: `reject` or `create` (see [`UnknownUserPolicy`])
//! - `CLONE_POLICY`: `warn` or `reject` (see [`ClonePolicy`])

use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;

/// Upper bound for every configured duration: one year
pub const MAX_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

/// What begin-login does with a login name nobody has registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownUserPolicy {
    /// Fail with `UserNotFound`; login attempts never create accounts
    Reject,
    /// Create the user and let the ceremony engine fail on the empty
    /// credential list
    Create,
}

impl FromStr for UnknownUserPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "create" => Ok(Self::Create),
            other => Err(anyhow!("unknown user policy must be 'reject' or 'create', got '{other}'")),
        }
    }
}

/// What finish-login does when the engine flags a possibly cloned authenticator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClonePolicy {
    /// Log a security warning and let the login through
    Warn,
    /// Log a security warning and refuse the login
    Reject,
}

impl FromStr for ClonePolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            other => Err(anyhow!("clone policy must be 'warn' or 'reject', got '{other}'")),
        }
    }
}

/// Application configuration
///
/// ## WebAuthn Terminology
/// - **RP (Relying Party)**: Your application/website that relies on authentication
/// - **RP ID**: Your domain name (e.g., "example.com" or "localhost")
/// - **RP Origins**: Full URLs the browser may run the ceremony from
///   (e.g., "https://example.com")
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// WebAuthn Relying Party ID; must match the domain the app is served from
    pub rp_id: String,

    /// Shown to users during passkey creation
    pub rp_name: String,

    /// Allowed origins; the first one is the primary origin
    pub rp_origins: Vec<String>,

    /// Static frontend files
    pub static_dir: String,

    pub ceremony_ttl_secs: i64,
    pub session_ttl_secs: i64,
    pub sweep_interval_secs: u64,

    /// Add `Secure` to session cookies. Browsers accept secure cookies on
    /// `http://localhost`, so this stays on for local development too.
    pub cookie_secure: bool,

    pub unknown_user_policy: UnknownUserPolicy,
    pub clone_policy: ClonePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rp_id: "localhost".to_string(),
            rp_name: "Passkey Demo".to_string(),
            rp_origins: vec!["http://localhost:8080".to_string()],
            static_dir: "web".to_string(),
            ceremony_ttl_secs: 300,
            session_ttl_secs: 3600,
            sweep_interval_secs: 600,
            cookie_secure: true,
            unknown_user_policy: UnknownUserPolicy::Reject,
            clone_policy: ClonePolicy::Warn,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` first if present (dotenvy doesn't error if the file is
    /// missing), then reads each variable, falling back to the defaults.
    ///
    /// ## Example .env file
    /// ```text
    /// HOST=127.0.0.1
    /// PORT=8080
    /// RP_ID=localhost
    /// RP_ORIGINS=http://localhost:8080
    /// RP_NAME=Passkey Demo
    /// UNKNOWN_USER_POLICY=reject
    /// CLONE_POLICY=warn
    /// ```
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their default; set keys must parse.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port.parse().context("PORT must be a valid port number")?;
        }
        if let Some(rp_id) = lookup("RP_ID") {
            config.rp_id = rp_id;
        }
        if let Some(rp_name) = lookup("RP_NAME") {
            config.rp_name = rp_name;
        }
        if let Some(origins) = lookup("RP_ORIGINS") {
            config.rp_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
            if config.rp_origins.is_empty() {
                return Err(anyhow!("RP_ORIGINS must list at least one origin"));
            }
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = dir;
        }
        if let Some(ttl) = lookup("CEREMONY_TTL_SECS") {
            config.ceremony_ttl_secs = parse_duration_secs(&ttl, "CEREMONY_TTL_SECS")?;
        }
        if let Some(ttl) = lookup("SESSION_TTL_SECS") {
            config.session_ttl_secs = parse_duration_secs(&ttl, "SESSION_TTL_SECS")?;
        }
        if let Some(every) = lookup("SESSION_SWEEP_SECS") {
            config.sweep_interval_secs = parse_duration_secs(&every, "SESSION_SWEEP_SECS")?.unsigned_abs();
        }
        if let Some(secure) = lookup("COOKIE_SECURE") {
            config.cookie_secure = parse_bool(&secure)
                .ok_or_else(|| anyhow!("COOKIE_SECURE must be true or false"))?;
        }
        if let Some(policy) = lookup("UNKNOWN_USER_POLICY") {
            config.unknown_user_policy = policy.parse()?;
        }
        if let Some(policy) = lookup("CLONE_POLICY") {
            config.clone_policy = policy.parse()?;
        }

        Ok(config)
    }

    /// Get the socket address to bind the server to
    ///
    /// Example: "127.0.0.1:8080"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ceremony_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.ceremony_ttl_secs)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.session_ttl_secs)
    }
}

// Fields are public, so a hand-built Config can still hold anything
fn ttl_from_secs(secs: i64) -> chrono::Duration {
    chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
}

fn parse_duration_secs(value: &str, key: &str) -> Result<i64> {
    let parsed: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if parsed <= 0 {
        return Err(anyhow!("{key} must be greater than zero"));
    }
    if parsed > MAX_DURATION_SECS {
        return Err(anyhow!("{key} must be at most {MAX_DURATION_SECS} seconds"));
    }
    Ok(parsed)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_source(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_source_yields_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.rp_id, "localhost");
        assert_eq!(config.rp_origins, vec!["http://localhost:8080"]);
        assert_eq!(config.unknown_user_policy, UnknownUserPolicy::Reject);
        assert_eq!(config.clone_policy, ClonePolicy::Warn);
        assert!(config.cookie_secure);
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            ("PORT", "9000"),
            ("RP_ID", "example.com"),
            ("RP_ORIGINS", "https://example.com, https://login.example.com"),
            ("SESSION_TTL_SECS", "60"),
            ("COOKIE_SECURE", "false"),
            ("UNKNOWN_USER_POLICY", "create"),
            ("CLONE_POLICY", "Reject"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.rp_id, "example.com");
        assert_eq!(
            config.rp_origins,
            vec!["https://example.com", "https://login.example.com"]
        );
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(60));
        assert!(!config.cookie_secure);
        assert_eq!(config.unknown_user_policy, UnknownUserPolicy::Create);
        assert_eq!(config.clone_policy, ClonePolicy::Reject);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(from_pairs(&[("PORT", "eighty")]).is_err());
        assert!(from_pairs(&[("SESSION_TTL_SECS", "0")]).is_err());
        assert!(from_pairs(&[("RP_ORIGINS", " , ")]).is_err());
        assert!(from_pairs(&[("CLONE_POLICY", "ignore")]).is_err());
        assert!(from_pairs(&[("COOKIE_SECURE", "maybe")]).is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert!(from_pairs(&[("CEREMONY_TTL_SECS", "10000000000000")]).is_err());
        assert!(from_pairs(&[("SESSION_TTL_SECS", "9223372036854775807")]).is_err());
        assert!(from_pairs(&[("SESSION_SWEEP_SECS", "31536001")]).is_err());

        let config = from_pairs(&[("SESSION_TTL_SECS", "31536000")]).unwrap();
        assert_eq!(config.session_ttl(), chrono::Duration::days(365));
    }

    #[test]
    fn out_of_range_fields_saturate_instead_of_panicking() {
        let config = Config {
            ceremony_ttl_secs: i64::MAX,
            ..Config::default()
        };
        assert_eq!(config.ceremony_ttl(), chrono::Duration::MAX);
    }
}
