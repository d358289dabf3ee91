//! Server-rendered HTML.
//!
//! Pages are plain HTML built with `format!`; the only script guards the form
//! against double submission while a reply is outstanding.
//!
//! # Structure
//!
//! - [`layout`]: Document shell and stylesheet
//! - [`components`]: Message bubbles, alerts, the creativity slider
//! - [`chat`]: Chat, about and configuration-error pages

pub mod chat;
pub mod components;
pub mod layout;

pub use chat::{ChatView, about_page, chat_page, config_error_page};
