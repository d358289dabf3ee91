//! Prompt submission: the one event the chat page handles.
//!
//! [`on_submit`] runs a whole exchange to completion: validate, claim the
//! session, call the model, record the result. The transcript only changes
//! when the model answered.

use serde::Serialize;

use crate::error::SubmitError;
use crate::llm::{ChatClient, Creativity};
use crate::session::Session;

/// A completed prompt/reply pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub prompt: String,
    pub reply: String,
    pub creativity: Creativity,
}

/// Handle one prompt submission for `session`.
///
/// Surrounding whitespace is stripped from `prompt` before it is sent and
/// recorded. `creativity` must already be normalized by the caller (see
/// [`Creativity::clamped`]).
///
/// # Errors
///
/// - [`SubmitError::EmptyPrompt`] for a blank prompt; nothing is sent.
/// - [`SubmitError::Busy`] while another exchange for this session is outstanding.
/// - [`SubmitError::Backend`] when the model call fails; the transcript is unchanged.
pub async fn on_submit(
    client: &ChatClient,
    session: &Session,
    prompt: &str,
    creativity: Creativity,
) -> Result<Exchange, SubmitError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(SubmitError::EmptyPrompt);
    }

    let Some(mut conversation) = session.try_begin_exchange() else {
        tracing::warn!(session_id = %session.id(), "Rejected prompt while a request is outstanding");
        return Err(SubmitError::Busy);
    };

    tracing::info!(
        session_id = %session.id(),
        conversation_id = %conversation.id(),
        prompt_length = prompt.len(),
        creativity = creativity.value(),
        "Sending prompt"
    );

    let reply = client.send(&mut conversation, prompt, creativity).await?;

    // Recorded before the slot is released so exchanges never interleave.
    session.append_exchange(prompt, reply.clone());
    drop(conversation);

    tracing::info!(
        session_id = %session.id(),
        reply_length = reply.len(),
        message_count = session.message_count(),
        "Exchange recorded"
    );

    Ok(Exchange {
        prompt: prompt.to_string(),
        reply,
        creativity,
    })
}
