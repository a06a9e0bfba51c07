use lefibot::{
    api::{start_server, ApiState},
    config::AppConfig,
    conversational::ChatAssistant,
    exchange_rate::ExchangeRateClient,
    gemini::GeminiClient,
    llm::LlmClient,
    tools::FinanceToolkit,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Both credentials are required before anything is served
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    info!("LefiBot Finance Tools - API Server");
    info!("Port: {}", config.port);
    info!("Model: {}", config.gemini_model);

    // Create components
    let gemini = GeminiClient::new(
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )?;
    let rates = ExchangeRateClient::new(
        config.exchange_rate_api_key.clone(),
        config.exchange_rate_base_url.clone(),
    )?;

    let llm = LlmClient::new(Arc::new(gemini), config.backoff);
    let toolkit = FinanceToolkit::new(llm.clone(), Arc::new(rates));
    let state = ApiState::new(toolkit, ChatAssistant::new(llm));

    info!("Starting API server...");
    start_server(state, config.port).await?;

    Ok(())
}
