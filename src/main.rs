use gameatron_botfile::{config::AppConfig, http, web, BotFileService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(anyhow::anyhow!("Failed to read .env: {}", e));
        }
    }

    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gameatron_botfile=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GameATron bot file service v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::init()?;
    info!(
        "Configuration loaded; environments: {}",
        config.environments.join(", ")
    );
    if !config.control_plane.conditional_update {
        warn!("Conditional resource updates are disabled; concurrent endpoint changes may be lost");
    }

    // One client for the whole process; components share its connection pool.
    let client = http::build_client(&config.control_plane)?;
    let service = Arc::new(BotFileService::from_config(client, config)?);

    let app = web::create_router(web::AppState { service });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
