//! roomd - room relay daemon
//!
//! Accepts verified peer connections, decides per connection which handler
//! set the peer gets, and keeps the room's membership and alias stores.

mod admin;
mod caps;
mod config;
mod db;
mod error;
mod handlers;
mod http;
mod identity;
mod metrics;
mod network;
mod state;
mod telemetry;

use crate::config::{Config, LogFormat};
use crate::db::Database;
use crate::identity::Identity;
use crate::network::Gateway;
use crate::state::{PrivacyHandle, PrivacyMode, Room};
use anyhow::Context as _;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    init_tracing(config.server.log_format);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    let self_identity: Identity = config.server.identity.parse()?;

    info!(
        room = %config.server.name,
        identity = %self_identity,
        "Starting roomd"
    );

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    info!(
        members = db.members().count().await?,
        "Membership store ready"
    );

    let privacy = load_privacy(&db, config.room.privacy_mode).await?;

    let room = Arc::new(Room::new(
        config.server.name.clone(),
        self_identity,
        db,
        privacy,
        config.listen.preamble_timeout(),
    ));

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(0);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        let shutdown = room.subscribe_shutdown();
        tokio::spawn(async move {
            http::run_http_server(metrics_port, shutdown).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let gateway = Gateway::bind(config.listen.address, Arc::clone(&room)).await?;
    let gateway_task = tokio::spawn(gateway.run());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    room.shutdown().await;
    gateway_task.await??;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load the persisted privacy mode, seeding it from config on first start.
///
/// An unknown persisted value is kept as-is: the room still starts, the
/// room's own identity can still connect and fix it, and every other
/// connection attempt is rejected until then.
async fn load_privacy(db: &Database, fallback: PrivacyMode) -> anyhow::Result<PrivacyHandle> {
    match db.room_config().privacy_mode_raw().await? {
        Some(raw) => {
            let handle = PrivacyHandle::from_raw(u8::try_from(raw).unwrap_or(u8::MAX));
            match handle.load() {
                Ok(mode) => info!(%mode, "Privacy mode loaded"),
                Err(e) => warn!(
                    error = %e,
                    "Persisted privacy mode is unknown; only the room identity can connect"
                ),
            }
            Ok(handle)
        }
        None => {
            db.room_config().set_privacy_mode(fallback).await?;
            info!(mode = %fallback, "Privacy mode seeded from config");
            Ok(PrivacyHandle::new(fallback))
        }
    }
}
