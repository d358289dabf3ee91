//! Scripted driver for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::BackendError;

use super::{LlmDriver, LlmRequest};

/// What the driver saw for one call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeenRequest {
    pub history_len: usize,
    pub prompt: String,
    pub temperature: f32,
}

/// Replays canned outcomes in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDriver {
    outcomes: Mutex<VecDeque<Result<String, BackendError>>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedDriver {
    pub fn new(outcomes: impl IntoIterator<Item = Result<String, BackendError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmDriver for ScriptedDriver {
    async fn generate(&self, req: LlmRequest<'_>) -> Result<String, BackendError> {
        self.seen.lock().unwrap().push(SeenRequest {
            history_len: req.history.len(),
            prompt: req.prompt.to_string(),
            temperature: req.settings.creativity.value(),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Network("script exhausted".to_string())))
    }
}
