//! Error taxonomy for the chat front-end.
//!
//! - [`ConfigError`]: missing or invalid configuration. Fatal to the session.
//! - [`BackendError`]: any failure while talking to the language model.
//!   Recovered locally; the transcript is left untouched.
//! - [`SubmitError`]: outcome of a rejected prompt submission.

use thiserror::Error;

/// Configuration error. No chat can proceed while one of these is present.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API key is absent or empty.
    #[error("Google API key not found. Set GOOGLE_API_KEY in the environment or in a .env file")]
    MissingApiKey,

    /// The API key is present but cannot be a valid credential.
    #[error("Google API key is malformed: {0}")]
    MalformedApiKey(&'static str),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Settings failed to load or validate.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Failure during a single exchange with the language model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Connection-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the client timeout.
    #[error("The language model did not answer in time")]
    Timeout,

    /// Quota or rate limit hit.
    #[error("Rate limited by the language model API, try again shortly")]
    RateLimited,

    /// Non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the API.
        message: String,
    },

    /// The prompt was rejected by the backend's safety filters.
    #[error("The prompt was blocked by the model: {0}")]
    Blocked(String),

    /// The response body could not be interpreted.
    #[error("Malformed response from the language model: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Why a prompt submission produced no exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Blank prompts are never sent.
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    /// Another request for this session is still outstanding.
    #[error("A request for this session is already in progress")]
    Busy,

    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A creativity value outside `[0.0, 1.0]` (or NaN) was given where clamping is not wanted.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Creativity must lie in [0.0, 1.0], got {0}")]
pub struct InvalidCreativity(pub f32);
