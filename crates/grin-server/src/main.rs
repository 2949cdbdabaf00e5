mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use grin_api::state::AppStateInner;
use grin_api::storage::ImageStore;
use grin_api::upload::Uploader;
use grin_api::{RouterConfig, router};
use grin_db::{Database, SystemClock};
use grin_vision::{Classifier, OnnxSmileModel};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grin=debug,grin_api=debug,grin_db=info,grin_vision=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // The model is loaded once; without it there is nothing to serve.
    let model = OnnxSmileModel::load(&config.model_path)?;
    let classifier = Classifier::new(Arc::new(model));

    let clock = SystemClock::with_offset_hours(config.utc_offset_hours)
        .context("invalid UTC offset")?;
    let db = Arc::new(Database::open(&config.db_path, Arc::new(clock))?);

    let store = Arc::new(ImageStore::new(config.images_dir.clone()).await?);
    tokio::fs::create_dir_all(&config.static_dir)
        .await
        .with_context(|| format!("creating {}", config.static_dir.display()))?;

    let uploader = Uploader::new(store, classifier, db.clone(), config.cleanup);
    let state = Arc::new(AppStateInner { db, uploader });

    let app = router(
        state,
        &RouterConfig {
            images_dir: config.images_dir.clone(),
            static_dir: config.static_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        },
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Grin server listening on {}", addr);
    info!("Orphaned uploads on failure: {:?}", config.cleanup);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
