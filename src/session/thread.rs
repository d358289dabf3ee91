//! Per-user chat sessions and the registry that holds them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::llm::{ConversationHandle, Message};

use super::Transcript;

/// Default session timeout (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A single chat session.
///
/// Owns the visible [`Transcript`] and the [`ConversationHandle`]. Cloning is
/// cheap and yields another reference to the same session.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier.
    id: String,
    /// Messages shown to the user.
    transcript: RwLock<Transcript>,
    /// Backend conversation. Held for the whole exchange, so it doubles as
    /// the in-flight slot.
    conversation: Mutex<ConversationHandle>,
    /// Session creation time.
    created_at: DateTime<Utc>,
    /// Last activity time.
    last_activity: RwLock<DateTime<Utc>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Create a new session with the given ID.
    fn new(id: String, conversation: ConversationHandle) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(SessionInner {
                id,
                transcript: RwLock::new(Transcript::new()),
                conversation: Mutex::new(conversation),
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Record a complete exchange. Both messages land under one lock.
    pub fn append_exchange(&self, prompt: impl Into<String>, reply: impl Into<String>) {
        write(&self.inner.transcript).append_exchange(prompt, reply);
        self.touch();
    }

    /// Empty the visible transcript.
    ///
    /// The conversation handle keeps its history: the model still remembers
    /// the earlier turns.
    pub fn clear(&self) {
        write(&self.inner.transcript).clear();
        self.touch();
    }

    /// Snapshot of the transcript in chronological order.
    ///
    /// Calling it again yields the same sequence until the next mutation.
    pub fn render(&self) -> std::vec::IntoIter<Message> {
        read(&self.inner.transcript)
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Copy of the whole transcript.
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        read(&self.inner.transcript).clone()
    }

    /// Get the number of messages in the transcript.
    #[must_use]
    pub fn message_count(&self) -> usize {
        read(&self.inner.transcript).len()
    }

    /// Claim the conversation for one exchange.
    ///
    /// Returns `None` while another exchange for this session is outstanding.
    /// A claimed exchange counts as activity whether or not it succeeds.
    #[must_use]
    pub fn try_begin_exchange(&self) -> Option<MutexGuard<'_, ConversationHandle>> {
        let guard = self.inner.conversation.try_lock().ok()?;
        self.touch();
        Some(guard)
    }

    /// Whether an exchange is currently outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.conversation.try_lock().is_err()
    }

    /// Turns the backend has seen, waiting for any outstanding exchange.
    pub async fn conversation_history(&self) -> Vec<Message> {
        self.inner.conversation.lock().await.history().to_vec()
    }

    /// Update the last activity timestamp.
    fn touch(&self) {
        *write(&self.inner.last_activity) = Utc::now();
    }

    /// Check if the session has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *read(&self.inner.last_activity);
        // A negative span means clock skew; treat as fresh.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    /// Session creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }
}

/// Thread-safe registry of sessions.
///
/// Each user gets an independent [`Session`]; nothing is shared between them.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a new session around an initialized conversation.
    pub fn create(&self, conversation: ConversationHandle) -> Session {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), conversation);
        write(&self.inner.sessions).insert(id, session.clone());
        session
    }

    /// Get a session by ID. A lookup counts as activity.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let session = read(&self.inner.sessions).get(id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<Session> {
        write(&self.inner.sessions).remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.inner.sessions).len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions that have been idle longer than the timeout.
    ///
    /// Sessions with an outstanding exchange are kept. Returns the number of
    /// sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = write(&self.inner.sessions);
        let before = guard.len();
        guard.retain(|_, session| session.is_busy() || !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        read(&self.inner.sessions).keys().cloned().collect()
    }
}
