mod config;
mod db;
mod error;
mod integrity;
mod persistence;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use merkle::CheckpointSigner;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::integrity::IntegrityService;
use crate::persistence::{InMemoryPersistence, Persistence};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let persistence: Box<dyn Persistence> = match &cfg.database_url {
        Some(url) => {
            let pool =
                db::connect_with_retry(url, cfg.db_connect_retries, cfg.db_retry_interval).await?;
            db::migrate(&pool).await?;
            info!("postgres: ok");
            Box::new(db::PgPersistence::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set: files and leaf digests are kept in memory only");
            Box::new(InMemoryPersistence::new())
        }
    };

    let signer = match &cfg.signing_key {
        Some(seed) => CheckpointSigner::from_bytes(seed),
        None => {
            warn!("SIGNING_KEY not set: using an ephemeral checkpoint key");
            CheckpointSigner::generate()
        }
    };
    info!(public_key = %hex::encode(signer.verifying_key().as_bytes()), "checkpoint signing key");

    let service = IntegrityService::restore(persistence, signer)
        .await
        .context("Failed to restore tree from persisted leaf digests")?;
    let app = routes::router(Arc::new(AppState::new(service)), cfg.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to listen on {}", cfg.bind_addr))?;
    info!(addr = %cfg.bind_addr, "file server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to install ctrl-c handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
