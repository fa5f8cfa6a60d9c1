use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundtrackr::config::Config;
use fundtrackr::AppState;

#[derive(Parser, Debug)]
#[command(name = "fundtrackr")]
#[command(author, version, about = "A community fund contribution and loan tracking backend", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "FUNDTRACKR_CONFIG", default_value = "fundtrackr.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting fundtrackr v{}", env!("CARGO_PKG_VERSION"));

    // Connect to MongoDB; startup fails loudly without a connection string
    let uri = config.database_uri()?;
    let db = fundtrackr::db::connect(&uri, &config.database.name).await?;

    // Ensure the configured admin account exists
    if let Some(password) = &config.auth.admin_password {
        fundtrackr::db::seed_admin_user(&db, &config.auth.admin_username, password).await?;
    }

    let state = Arc::new(AppState::new(config.clone(), db));
    let app = fundtrackr::api::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
