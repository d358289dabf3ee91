//! Small HTML fragments used by the pages.
//!
//! Every piece of user or model text goes through [`html_escape`] before it
//! reaches the markup.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::llm::{Creativity, Message, MessageRole};

/// Avatar shown next to a message.
#[must_use]
pub fn avatar(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "🧑‍💻",
        MessageRole::Assistant => "🤖",
    }
}

/// One transcript entry.
#[must_use]
pub fn message_bubble(message: &Message) -> String {
    let role = message.role();
    format!(
        r#"<div class="message {role}" data-role="{role}"><span class="avatar" aria-hidden="true">{avatar}</span><strong class="text">{text}</strong></div>"#,
        role = role.as_str(),
        avatar = avatar(role),
        text = encode_text(message.text()),
    )
}

/// Inline error box.
#[must_use]
pub fn error_alert(message: &str) -> String {
    format!(
        r#"<div class="alert" role="alert">⚠️ {}</div>"#,
        encode_text(message)
    )
}

/// Hidden "Thinking..." bubble revealed while a prompt is outstanding.
#[must_use]
pub fn thinking_placeholder() -> &'static str {
    r#"<div id="thinking" class="message assistant placeholder" hidden><span class="avatar" aria-hidden="true">🤖</span><strong class="text">Bot: Thinking...</strong></div>"#
}

/// Creativity slider bound to the chat form.
#[must_use]
pub fn creativity_slider(form_id: &str, value: Creativity) -> String {
    let form_id = encode_double_quoted_attribute(form_id);
    format!(
        r#"<label for="creativity"><strong>Creativity Level</strong></label>
        <input id="creativity" class="slider" type="range" name="creativity" form="{form_id}"
               min="{min:.1}" max="{max:.1}" step="{step:.1}" value="{value}"
               oninput="document.getElementById('creativity-value').value = Number(this.value).toFixed(1)">
        <output id="creativity-value" for="creativity">{value}</output>
        <p class="help">Higher values make responses more creative but potentially less focused</p>"#,
        min = Creativity::MIN,
        max = Creativity::MAX,
        step = Creativity::STEP,
    )
}
