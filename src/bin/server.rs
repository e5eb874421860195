use mortgage_advisor::{
    advisor::MortgageAdvisor,
    api::{start_server, ApiState},
    config::AdvisorConfig,
    leads::{build_lead_store, build_notifier},
    widget::WidgetResource,
};
use std::sync::Arc;
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

    let config = AdvisorConfig::from_env();

    info!("🏠 Mortgage Advisor - Tool Server");
    info!("📍 Address: {}", config.bind_address());

    // Create components
    let advisor = Arc::new(MortgageAdvisor::from_config(&config)?);
    let leads = build_lead_store(&config);
    let notifier = build_notifier(&config);
    let widget = Arc::new(WidgetResource::load(&config.widget_dir));

    let state = ApiState {
        advisor,
        leads,
        notifier,
        widget,
        prequal_url: config.prequal_url.clone(),
    };

    info!("✅ Advisor initialized");
    info!("📡 Starting tool server...");

    start_server(state, &config.bind_address()).await?;

    Ok(())
}
