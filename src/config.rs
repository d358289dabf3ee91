use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::llm::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::llm::{Creativity, GeminiSettings};
use crate::session::DEFAULT_SESSION_TIMEOUT;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Gemini model identifier
    #[arg(long, env = "GEMINI_MODEL")]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub session: SessionConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Upper bound for any single HTTP request, including the model call.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub default_creativity: f32,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Layering, lowest to highest: defaults, config file, `CHAT_` environment, CLI.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.request_timeout_secs", 120)?
            .set_default("gemini.base_url", DEFAULT_BASE_URL)?
            .set_default("gemini.model", DEFAULT_MODEL)?
            .set_default("gemini.timeout_secs", 60)?
            .set_default("session.idle_timeout_secs", DEFAULT_SESSION_TIMEOUT.as_secs())?
            .set_default("session.cleanup_interval_secs", 60)?
            .set_default("ui.default_creativity", f64::from(Creativity::DEFAULT))?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        // CHAT_SERVER__PORT=8000 -> server.port
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("gemini.model", model)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("gemini.base_url cannot be empty".to_string()));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(ConfigError::Invalid("gemini.model cannot be empty".to_string()));
        }
        Creativity::new(self.ui.default_creativity)
            .map_err(|e| ConfigError::Invalid(format!("ui.default_creativity: {e}")))?;
        Ok(())
    }

    /// Driver settings derived from the `gemini` section.
    #[must_use]
    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            base_url: self.gemini.base_url.clone(),
            model: self.gemini.model.clone(),
            timeout: Duration::from_secs(self.gemini.timeout_secs),
        }
    }

    /// Slider position for a fresh page.
    #[must_use]
    pub fn default_creativity(&self) -> Creativity {
        Creativity::clamped(self.ui.default_creativity)
    }
}

/// Read the API key once. Whitespace-only counts as absent.
#[must_use]
pub fn load_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
}
