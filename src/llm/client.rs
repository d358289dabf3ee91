//! Chat client: one request/response exchange per call.
//!
//! The Gemini REST API keeps no server-side conversation, so the
//! [`ConversationHandle`] carries the turn history that is replayed with every
//! request. It only grows on success, which keeps it aligned with what the
//! backend has actually answered.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{BackendError, ConfigError};

use super::{ApiKey, Creativity, GenerationSettings, LlmDriver, LlmRequest, Message};

/// Backend-side conversation state owned by exactly one session.
#[derive(Debug)]
pub struct ConversationHandle {
    id: String,
    api_key: ApiKey,
    history: Vec<Message>,
}

impl ConversationHandle {
    /// Unique identifier, used for log correlation.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Turns the backend has seen, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

/// Wraps the outbound call to the language model.
#[derive(Clone)]
pub struct ChatClient {
    driver: Arc<dyn LlmDriver>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("driver", &"LlmDriver")
            .finish()
    }
}

impl ChatClient {
    /// Create a client on top of the given driver.
    #[must_use]
    pub fn new(driver: Arc<dyn LlmDriver>) -> Self {
        Self { driver }
    }

    /// Validate the credential and start a fresh conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the key is empty or malformed. No chat can
    /// proceed without a handle.
    pub fn initialize(&self, api_key: &str) -> Result<ConversationHandle, ConfigError> {
        let api_key = ApiKey::parse(api_key)?;
        let handle = ConversationHandle {
            id: Uuid::new_v4().to_string(),
            api_key,
            history: Vec::new(),
        };
        tracing::debug!(conversation_id = %handle.id, "Conversation started");
        Ok(handle)
    }

    /// Send `prompt` and wait for the complete reply.
    ///
    /// Makes exactly one attempt. On success the handle records both turns; on
    /// failure it is left as it was.
    pub async fn send(
        &self,
        handle: &mut ConversationHandle,
        prompt: &str,
        creativity: Creativity,
    ) -> Result<String, BackendError> {
        let req = LlmRequest {
            api_key: &handle.api_key,
            history: &handle.history,
            prompt,
            settings: GenerationSettings { creativity },
        };

        let outcome = self.driver.generate(req).await;
        match outcome {
            Ok(reply) => {
                handle.history.push(Message::user(prompt));
                handle.history.push(Message::assistant(reply.clone()));
                tracing::debug!(
                    conversation_id = %handle.id,
                    reply_length = reply.len(),
                    history_len = handle.history.len(),
                    "Exchange complete"
                );
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %handle.id,
                    error = %e,
                    "Exchange failed"
                );
                Err(e)
            }
        }
    }
}
