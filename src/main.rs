use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use foods_api::{
    create_app, init_observability,
    observability::{Metrics, ObservabilitySettings},
    repositories,
    services::FoodService,
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (before logging is installed)
    let config = Config::from_environment().context("Failed to load configuration")?;

    init_observability(ObservabilitySettings {
        service_name: &config.observability.service_name,
        service_version: &config.observability.service_version,
        otlp_endpoint: config.observability.otlp_endpoint.as_deref(),
        log_level: &config.observability.log_level,
        enable_json_logging: config.observability.enable_json_logging,
    })
    .context("Failed to initialize observability")?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Table: {}", config.database.table_name);

    let metrics = Arc::new(Metrics::new().context("Failed to initialize metrics")?);
    info!("Metrics initialized successfully");

    // The store must be reachable before the port is bound
    let repository = repositories::connect(&config.database)
        .await
        .context("Failed to connect to the document store")?;
    info!("Repository initialized successfully");

    let update_policy = config.server.update_emptiness_policy()?;
    let food_service = Arc::new(
        FoodService::new(repository, update_policy)
            .with_metrics(metrics.clone(), config.database.table_name.clone()),
    );
    info!(update_policy = %update_policy, "Services initialized successfully");

    let app = create_app(food_service, metrics, &config.server);

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid bind address {}", config.server.host))?,
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                // Keep serving; the process can still be killed externally
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
