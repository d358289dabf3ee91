//! Chat, about and configuration-error pages.

use html_escape::encode_double_quoted_attribute;

use crate::llm::{Creativity, Message};

use super::components::{
    creativity_slider, error_alert, message_bubble, thinking_placeholder,
};
use super::layout::{APP_TITLE, html_shell};

/// `id` of the form every chat control submits through.
const FORM_ID: &str = "chat-form";

/// Guards against double submission and reveals the placeholder.
const SUBMIT_SCRIPT: &str = r"<script>
(() => {
  const form = document.getElementById('chat-form');
  if (!form) return;
  form.addEventListener('submit', (event) => {
    if (event.submitter && event.submitter.hasAttribute('formaction')) return;
    if (form.dataset.busy) { event.preventDefault(); return; }
    form.dataset.busy = '1';
    const thinking = document.getElementById('thinking');
    if (thinking) { thinking.hidden = false; thinking.scrollIntoView(); }
  });
  window.scrollTo(0, document.body.scrollHeight);
})();
</script>";

/// Everything the chat page shows.
#[derive(Debug, Clone)]
pub struct ChatView<'a> {
    pub messages: &'a [Message],
    pub creativity: Creativity,
    pub model: &'a str,
    /// Inline error from the last submission, if it failed.
    pub error: Option<&'a str>,
    /// Prompt to put back into the input after a failure.
    pub draft: Option<&'a str>,
}

fn sidebar(view: &ChatView<'_>) -> String {
    format!(
        r#"<aside class="sidebar">
    <h2>⚙️ Chat Settings</h2>
    {slider}
    <p><button type="submit" form="{FORM_ID}" formaction="/clear" formnovalidate>🗑️ Clear Chat History</button></p>
    <hr>
    <h3>About</h3>
    <p>This is an enhanced chatbot powered by:</p>
    <ul><li>Google's Gemini (<code>{model}</code>)</li><li>Rust, Axum and Tokio</li></ul>
    <p><a href="/about">More about this app</a></p>
</aside>"#,
        slider = creativity_slider(FORM_ID, view.creativity),
        model = html_escape::encode_text(view.model),
    )
}

/// Render the chat page.
#[must_use]
pub fn chat_page(view: &ChatView<'_>) -> String {
    let mut messages = String::new();
    if view.messages.is_empty() && view.error.is_none() {
        messages.push_str(r#"<p class="empty">No messages yet. Say hello!</p>"#);
    }
    for message in view.messages {
        messages.push_str(&message_bubble(message));
    }
    messages.push_str(thinking_placeholder());
    if let Some(error) = view.error {
        messages.push_str(&error_alert(&format!("Error generating response: {error}")));
    }

    let draft = view
        .draft
        .map(|d| encode_double_quoted_attribute(d).into_owned())
        .unwrap_or_default();

    let content = format!(
        r#"<div class="layout">
{sidebar}
<main class="main">
    <h1>🤖 {APP_TITLE}</h1>
    <hr>
    <section class="messages" aria-live="polite" aria-label="Chat messages">{messages}</section>
    <form id="{FORM_ID}" class="composer" method="post" action="/chat">
        <input type="text" name="message" value="{draft}" placeholder="What's on your mind? Ask away..." autocomplete="off" autofocus required>
        <button class="primary" type="submit">Send</button>
    </form>
</main>
</div>
{SUBMIT_SCRIPT}"#,
        sidebar = sidebar(view),
    );

    html_shell("Chat", &content)
}

/// Render the about page.
#[must_use]
pub fn about_page(model: &str) -> String {
    let content = format!(
        r#"<main class="main">
    <h1>About {APP_TITLE}</h1>
    <hr>
    <p>A minimal chat front-end for Google's Gemini (<code>{model}</code>).
    Each browser gets its own session; the transcript lives in memory only and
    is gone when the server restarts.</p>
    <ul>
        <li><strong>Creativity Level</strong> sets the sampling temperature, from 0.0 (focused) to 1.0 (creative).</li>
        <li><strong>Clear Chat History</strong> empties the visible transcript. The model still remembers the earlier turns of the conversation.</li>
    </ul>
    <p><a href="/">Start chatting</a></p>
</main>"#,
        model = html_escape::encode_text(model),
    );
    html_shell("About", &content)
}

/// Render the fatal configuration error page. No chat controls are offered.
#[must_use]
pub fn config_error_page(message: &str) -> String {
    let content = format!(
        r#"<main class="main">
    <h1>🤖 {APP_TITLE}</h1>
    <hr>
    {alert}
    <p class="help">The chat is unavailable until the server is restarted with a valid API key.</p>
</main>"#,
        alert = error_alert(message),
    );
    html_shell("Configuration error", &content)
}
