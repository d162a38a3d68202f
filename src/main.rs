//! # Passkey Session Server
//!
//! Entry point: load configuration, build the shared state, start the session
//! sweeper and serve the router.

use passkey_session_server::{build_router, store::sessions::run_sweeper, AppState, Config};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main application entry point
///
/// This function:
/// 1. Sets up logging
/// 2. Loads configuration from environment variables
/// 3. Initializes the stores and the WebAuthn engine
/// 4. Starts a background task to purge expired sessions
/// 5. Starts the HTTP server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: info level for most crates, debug level for our app
    // Can be overridden with RUST_LOG environment variable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passkey_session_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    let app_state = AppState::new(&config)?;
    tracing::info!(
        rp_id = %config.rp_id,
        origins = ?config.rp_origins,
        unknown_user_policy = ?config.unknown_user_policy,
        clone_policy = ?config.clone_policy,
        "Application state initialized"
    );

    // Readers already ignore expired sessions; this only reclaims memory
    tokio::spawn(run_sweeper(
        app_state.sessions.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    ));

    let app = build_router(app_state);

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
