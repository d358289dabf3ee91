#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::sync::Notify;

use gemini_chat::AppState;
use gemini_chat::config::AppConfig;
use gemini_chat::error::BackendError;
use gemini_chat::llm::{ChatClient, LlmDriver, LlmRequest};
use gemini_chat::server::router;

/// How the mock answers the next call.
#[derive(Clone)]
pub enum Behavior {
    /// Always answer with this text.
    Reply(String),
    /// Answer with `echo: <prompt>`.
    Echo,
    /// Fail every call.
    Fail(BackendError),
    /// Signal `entered`, then wait for `release` before answering.
    Gated {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub history_len: usize,
    pub prompt: String,
    pub temperature: f32,
}

pub struct MockDriver {
    behavior: Mutex<Behavior>,
    seen: Mutex<Vec<Seen>>,
}

impl MockDriver {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmDriver for MockDriver {
    async fn generate(&self, req: LlmRequest<'_>) -> Result<String, BackendError> {
        self.seen.lock().unwrap().push(Seen {
            history_len: req.history.len(),
            prompt: req.prompt.to_string(),
            temperature: req.settings.creativity.value(),
        });
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Reply(text) => Ok(text),
            Behavior::Echo => Ok(format!("echo: {}", req.prompt)),
            Behavior::Fail(err) => Err(err),
            Behavior::Gated { entered, release } => {
                entered.notify_one();
                release.notified().await;
                Ok("released".to_string())
            }
        }
    }
}

/// Build the app around `driver` with default configuration.
pub fn app(driver: &Arc<MockDriver>, api_key: Option<&str>) -> (AppState, Router) {
    let config = Arc::new(AppConfig::load_from_args(["gemini-chat"]).expect("default config"));
    let client = ChatClient::new(Arc::clone(driver) as Arc<dyn LlmDriver>);
    let state = AppState::new(config, client, api_key.map(str::to_string));
    let router = router(state.clone());
    (state, router)
}
