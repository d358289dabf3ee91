//! Session and transcript management.
//!
//! This module provides in-memory session storage. Every user gets an
//! independent [`Session`] holding the visible [`Transcript`] and the
//! backend conversation; nothing survives a restart.
//!
//! # Architecture
//!
//! - [`Transcript`]: Ordered record of prompts and replies
//! - [`Session`]: One user's transcript and conversation handle
//! - [`SessionStore`]: Thread-safe registry of all active sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_chat::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let session = store.create(client.initialize(&api_key)?);
//! session.append_exchange("hello", "hi there");
//!
//! assert_eq!(session.render().count(), 2);
//! ```

mod thread;
mod transcript;

pub use thread::{DEFAULT_SESSION_TIMEOUT, Session, SessionStore};
pub use transcript::Transcript;
