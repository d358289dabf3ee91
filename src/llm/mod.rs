//! Language model client and its data types.
//!
//! # Overview
//!
//! The [`LlmDriver`] trait is the single seam between this crate and the
//! generative-language backend: one prompt in, one complete reply out. The
//! [`ChatClient`] builds on top of a driver and owns the request/response
//! exchange for a [`ConversationHandle`].
//!
//! # Drivers
//!
//! - [`GeminiDriver`]: Google Generative Language API (`models/{model}:generateContent`)
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_chat::llm::{ChatClient, Creativity, GeminiDriver, GeminiSettings};
//!
//! let driver = GeminiDriver::new(GeminiSettings::default())?;
//! let client = ChatClient::new(Arc::new(driver));
//! let mut handle = client.initialize("AIza...")?;
//! let reply = client.send(&mut handle, "hello", Creativity::default()).await?;
//! ```

pub mod client;
pub mod gemini;
#[cfg(test)]
pub(crate) mod scripted;

pub use client::{ChatClient, ConversationHandle};
pub use gemini::{GeminiDriver, GeminiSettings};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, ConfigError, InvalidCreativity};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User prompt.
    User,
    /// Model reply.
    Assistant,
}

impl MessageRole {
    /// Lowercase name used in HTML and JSON output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: MessageRole,
    text: String,
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn role(&self) -> MessageRole {
        self.role
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Sampling creativity, forwarded to the backend as `temperature`.
///
/// Always lies in `[0.0, 1.0]`. The UI exposes it at `0.1` granularity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Creativity(f32);

impl Creativity {
    /// Lowest accepted value.
    pub const MIN: f32 = 0.0;
    /// Highest accepted value.
    pub const MAX: f32 = 1.0;
    /// Slider granularity.
    pub const STEP: f32 = 0.1;
    /// Value used when none is chosen.
    pub const DEFAULT: f32 = 0.7;

    const STEPS_PER_UNIT: f32 = 10.0;

    /// Strict constructor: rejects NaN and values outside the range.
    pub fn new(value: f32) -> Result<Self, InvalidCreativity> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidCreativity(value))
        }
    }

    /// Caller-side normalization of untrusted input.
    ///
    /// Clamps into range and snaps to the slider grid; NaN becomes the default.
    #[must_use]
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            return Self(Self::DEFAULT);
        }
        let snapped = (value.clamp(Self::MIN, Self::MAX) * Self::STEPS_PER_UNIT).round()
            / Self::STEPS_PER_UNIT;
        // abs() folds -0.0 into 0.0
        Self(snapped.clamp(Self::MIN, Self::MAX).abs())
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// The value as an `f64` rounded to tenths, so `0.7` goes out as `0.7`.
    #[must_use]
    pub fn temperature(self) -> f64 {
        (f64::from(self.0) * f64::from(Self::STEPS_PER_UNIT)).round()
            / f64::from(Self::STEPS_PER_UNIT)
    }
}

impl Default for Creativity {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl Serialize for Creativity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.temperature())
    }
}

impl fmt::Display for Creativity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Per-request generation parameters. Read fresh on every request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationSettings {
    pub creativity: Creativity,
}

/// A validated API credential.
///
/// `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate a raw key.
    ///
    /// Surrounding whitespace is ignored; an empty key is missing, and a key
    /// with inner whitespace or non-printable characters is malformed.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ConfigError::MalformedApiKey(
                "contains whitespace or non-printable characters",
            ));
        }
        Ok(Self(key.to_string()))
    }

    /// The raw key, for request headers only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Request to an LLM driver.
#[derive(Debug)]
pub struct LlmRequest<'a> {
    /// Credential for this conversation.
    pub api_key: &'a ApiKey,
    /// Earlier turns of the conversation, oldest first.
    pub history: &'a [Message],
    /// The new user prompt.
    pub prompt: &'a str,
    /// Generation parameters for this call only.
    pub settings: GenerationSettings,
}

/// Trait for language model drivers.
///
/// One call is one attempt: implementations must not retry.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Produce the complete reply for `req`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] on network, status or decoding failures.
    async fn generate(&self, req: LlmRequest<'_>) -> Result<String, BackendError>;
}
