use guardian_financiero::{api::start_server, AppConfig, GuardianApp};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("Guardián Financiero - API Server");
    info!(
        port = config.port,
        delay_scale = config.delay_scale,
        storage = ?config.storage_path,
        "Configuration loaded"
    );

    let app = GuardianApp::from_config(&config).await?;

    info!("Application initialized");
    info!("Starting API server...");

    start_server(app, config.port).await?;

    Ok(())
}
