use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use autopull::config::AppConfig;
use autopull::metrics;
use autopull::notifications::{MeowNotifier, NotificationGateway};
use autopull::runtime::DockerCli;
use autopull::sync::SyncEngine;
use autopull::webhook::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autopull=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Autopull - registry webhook image sync");

    let config = Arc::new(AppConfig::from_env());

    metrics::register_metrics();

    let runtime = Arc::new(DockerCli::new(config.runtime.clone()));
    let sync_engine = Arc::new(SyncEngine::new(runtime, config.registry.clone()));
    let gateway: Arc<dyn NotificationGateway> =
        Arc::new(MeowNotifier::new(config.notifier.clone())?);

    let state = AppState {
        config: config.clone(),
        sync_engine,
        gateway,
    };
    let app = webhook::build_router(state);

    info!("Starting webhook server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
