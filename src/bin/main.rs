use guardian_financiero::{
    auth::InMemoryKeyValueStore,
    auth::SimulatedBiometric,
    models::{CategoryFilter, FraudDecision, Screen},
    stores::MarketplaceQuery,
    AppConfig, GuardianApp,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Waits until every scheduled action has resolved
async fn settle(app: &GuardianApp) {
    while !app.pending().is_idle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn show(app: &GuardianApp, title: &str) -> Result<(), Box<dyn std::error::Error>> {
    settle(app).await;
    println!("\n=== {} ===", title);
    println!("{}", serde_json::to_string_pretty(&app.view().await)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!(delay_scale = config.delay_scale, "Guardián Financiero demo starting");

    // Fresh in-memory storage so the walkthrough always starts at PIN setup
    let store = Arc::new(InMemoryKeyValueStore::new());
    let biometric = Arc::new(SimulatedBiometric::from_config(&config.biometric));
    let app = GuardianApp::start(config.delays.clone(), store, biometric).await?;

    show(&app, "FIRST RUN").await?;

    app.enter_pin("1234").await?;
    app.enter_confirm_pin("1234").await?;
    app.submit_pin_setup().await?.finish().await?;
    app.skip_biometric().await?.finish().await?;
    show(&app, "DASHBOARD").await?;

    app.navigate(Screen::Trust).await?.finish().await?;
    app.toggle_contact(3).await?.finish().await?;
    show(&app, "TRUSTED CIRCLE").await?;

    app.back().await?.finish().await?;
    app.navigate(Screen::Alerts).await?.finish().await?;
    app.navigate(Screen::FraudAlert).await?.finish().await?;
    app.resolve_fraud_alert(FraudDecision::Block).await?.finish().await?;
    show(&app, "AFTER FRAUD DECISION").await?;

    app.navigate(Screen::Marketplace).await?.finish().await?;
    app.set_marketplace_query(MarketplaceQuery {
        category: CategoryFilter::All,
        search: "salud".to_string(),
    })
    .await?;
    show(&app, "MARKETPLACE: salud").await?;

    app.back().await?.finish().await?;
    app.navigate(Screen::VoiceAssistant).await?.finish().await?;
    app.start_listening().await?.finish().await?;
    show(&app, "VOICE ASSISTANT").await?;

    app.logout().await?.finish().await?;
    show(&app, "SIGNED OUT").await?;

    info!("Demo finished");
    Ok(())
}
