//! Gemini Chat server
//!
//! Entry point: loads configuration and the API key, then serves the chat UI.

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use gemini_chat::config::{AppConfig, load_api_key};
use gemini_chat::llm::{ChatClient, GeminiDriver};
use gemini_chat::server::start_server;

/// Global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(AppConfig::load().context("Failed to load configuration")?);

    let api_key = load_api_key();
    if api_key.is_none() {
        tracing::error!(
            name: "config.api_key.missing",
            "GOOGLE_API_KEY is not set; the chat will report a configuration error"
        );
    }

    let driver = GeminiDriver::new(config.gemini_settings())
        .context("Failed to initialize the Gemini driver")?;
    let client = ChatClient::new(Arc::new(driver));

    start_server(config, client, api_key).await
}
