mod classifier;
mod config;
mod db;
mod error;
mod extractors;
mod moderation;
mod notify;
mod presence;
mod review;
mod rewards;
mod routes;
mod scoring;
mod settings;
mod state;
mod time;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::classifier::lexicon::LexiconLoader;
use crate::classifier::Classifier;
use crate::config::{Cli, Config};
use crate::notify::{LogNotifier, Notifier, PushGateway};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Toxicity model loads lazily on first submission.
    let classifier = Arc::new(Classifier::new(LexiconLoader));

    let notifier: Arc<dyn Notifier> = match &config.notify.gateway_url {
        Some(gateway) => {
            let endpoint = url::Url::parse(gateway)?;
            tracing::info!("Push gateway: {}", endpoint);
            Arc::new(PushGateway::new(pool.clone(), endpoint))
        }
        None => {
            tracing::warn!("No push gateway configured; notifications will be logged and dropped");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState {
        db: pool.clone(),
        config: config.clone(),
        classifier,
        notifier,
    };

    // Background presence sweep keeps the active count honest.
    tokio::spawn(presence::run_sweeper(
        pool,
        config.presence.ttl_secs,
        config.presence.sweep_secs,
    ));

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
