//! Gemini Chat
//!
//! A minimal web chat front-end for Google's Gemini. Each browser session
//! keeps an in-memory transcript; prompts are sent with the full conversation
//! history and a user-chosen creativity (sampling temperature).
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server rendering plain HTML plus a small JSON API
//! - **LLM**: `LlmDriver` seam with a Gemini `generateContent` implementation
//! - **Sessions**: Transcript and backend conversation per session, swept when idle
//!
//! # Modules
//!
//! - [`chat`]: The submit handler tying a session to the client
//! - [`config`]: Layered configuration and CLI
//! - [`error`]: Configuration, backend and submission errors
//! - [`llm`]: Messages, creativity, chat client and drivers
//! - [`server`]: Routes, middleware and startup
//! - [`session`]: Transcripts and the session registry
//! - [`ui`]: HTML rendering

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod session;
pub mod ui;

use crate::config::AppConfig;
use crate::error::ConfigError;

use llm::{ApiKey, ChatClient};
use session::{Session, SessionStore};
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chat client shared by every session.
    pub client: Arc<ChatClient>,
    /// Session store for conversation management.
    pub sessions: SessionStore,
    /// The API key read at startup, or why it cannot be used.
    pub api_key: Result<String, ConfigError>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Validate the startup key once; a bad key disables chat for the process lifetime.
    pub fn new(config: Arc<AppConfig>, client: ChatClient, api_key: Option<String>) -> Self {
        let api_key = api_key
            .ok_or(ConfigError::MissingApiKey)
            .and_then(|raw| ApiKey::parse(&raw).map(|_| raw));
        Self {
            client: Arc::new(client),
            sessions: SessionStore::new(),
            api_key,
            config,
        }
    }

    /// Start a session with a fresh backend conversation.
    pub fn new_session(&self) -> Result<Session, ConfigError> {
        let raw = self.api_key.as_ref().map_err(Clone::clone)?;
        let conversation = self.client.initialize(raw)?;
        Ok(self.sessions.create(conversation))
    }
}
