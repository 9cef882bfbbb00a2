//! # sitehubd: sitehub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`sitehub.toml`, `SITEHUB_*` env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on both adapters.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use sitehub_adapter_http_axum::router;
use sitehub_adapter_http_axum::state::AppState;
use sitehub_adapter_storage_sqlite_sqlx::{SqliteGroupRepository, SqliteSiteRepository};
use sitehub_app::services::{GroupService, SiteService};

use crate::config::Config;

const FALLBACK_FILTER: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("unable to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Database
    let db = config
        .storage()
        .build()
        .await
        .context("unable to open database")?;
    let pool = db.pool().clone();

    // Services
    let group_service = GroupService::new(
        SqliteGroupRepository::new(pool.clone()),
        SqliteSiteRepository::new(pool.clone()),
    );
    let site_service = SiteService::new(
        SqliteSiteRepository::new(pool.clone()),
        SqliteGroupRepository::new(pool),
    );

    // HTTP
    let app = router::build(AppState::new(group_service, site_service));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("unable to bind {bind_addr}"))?;
    tracing::info!(address = %bind_addr, "sitehubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("sitehubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
