use search_gateway::backend::connector_from_config;
use search_gateway::{router, AppState, Config, ConnectionManager, ConnectionOptions};
use tokio::net::TcpListener;
use tokio::sync::watch;

fn load_config() -> Config {
    if let Ok(path) = std::env::var("GATEWAY_CONFIG") {
        match Config::from_file(&path) {
            Ok(config) => return config,
            Err(e) => tracing::warn!("Cannot read config file {}: {}", path, e),
        }
    }

    Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Invalid environment configuration, using defaults: {}", e);
        Config::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    search_gateway::init_logging();
    search_gateway::init_metrics();

    tracing::info!("Starting search gateway");

    let config = load_config();
    tracing::info!("Loaded configuration: {:?}", config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let connector = connector_from_config(&config.backend);
    let connections = ConnectionManager::connect(
        connector,
        ConnectionOptions::from(&config.backend),
        shutdown_rx,
    )
    .await;

    let state = AppState::new(connections.clone(), &config)?;
    let app = router(state);

    let listener = TcpListener::bind(config.server.address).await?;
    tracing::info!("Search gateway listening on {}", config.server.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown requested");
            shutdown_tx.send_replace(true);
        })
        .await?;

    connections.join_retry_task().await;
    tracing::info!("Search gateway stopped");
    Ok(())
}
