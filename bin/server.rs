// Money Manager - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use money_manager::api::{build_router, AppState};
use money_manager::{logging, Config, IncomeService};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "money-server", version, about = "Money manager REST API")]
struct ServerArgs {
    /// Database file (overrides MONEY_MANAGER_DB and the config file)
    #[arg(long)]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides bind_address from the config file)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter(logging::SERVER_LOG_LEVEL))
        .init();

    info!("Starting money-server v{}", money_manager::VERSION);

    let args = ServerArgs::parse();
    let config = Config::load(args.config.as_deref(), args.db.as_deref())
        .context("Failed to load configuration")?;

    let service = IncomeService::open(&config)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    info!("✓ Database opened: {}", config.database_path.display());

    let app = build_router(AppState::new(service, config.default_page_size));

    let addr = args.bind.unwrap_or(config.bind_address);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🚀 Server running on http://{}", addr);
    info!("   API: http://{}/api/incomes", addr);

    axum::serve(listener, app).await.context("Server stopped")?;

    Ok(())
}
