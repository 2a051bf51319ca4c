//! Per-session transcripts and the sliding-window trim that bounds them.

use std::collections::HashMap;
use std::fmt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::HistoryPolicy;
use crate::turn::{Role, Turn};

/// Identifier of one chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Bound `transcript` to the system turn plus the most recent
/// `2 * policy.max_turns` turns.
///
/// A missing system turn is synthesized from `policy.system_prompt`. The input
/// is left untouched and order is preserved.
///
/// ```
/// use hearth::{HistoryPolicy, Turn, trim};
/// let policy = HistoryPolicy::new("sys", 1);
/// let out = trim(&[Turn::user("a"), Turn::assistant("b"), Turn::user("c")], &policy);
/// assert_eq!(out, vec![Turn::system("sys"), Turn::assistant("b"), Turn::user("c")]);
/// ```
pub fn trim(transcript: &[Turn], policy: &HistoryPolicy) -> Vec<Turn> {
    let (system, rest) = match transcript.split_first() {
        Some((first, rest)) if first.role() == Role::System => (first.clone(), rest),
        _ => (Turn::system(policy.system_prompt.clone()), transcript),
    };
    let keep = policy.max_turns.saturating_mul(2);
    let start = rest.len().saturating_sub(keep);

    let mut out = Vec::with_capacity(1 + rest.len() - start);
    out.push(system);
    out.extend_from_slice(&rest[start..]);
    out
}

/// Transcripts of every live session.
///
/// Each session is expected to have a single writer: callers take a copy with
/// [`SessionStore::transcript`], extend it, and hand it back with
/// [`SessionStore::store`].
#[derive(Debug, Default)]
pub struct SessionStore {
    policy: HistoryPolicy,
    sessions: Mutex<HashMap<SessionId, Vec<Turn>>>,
}

impl SessionStore {
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            policy,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &HistoryPolicy {
        &self.policy
    }

    /// Seed the session with the system turn unless it already has a
    /// transcript.
    pub async fn ensure_session(&self, id: SessionId) {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(id).or_insert_with(|| {
            tracing::debug!(session = %id, "session started");
            vec![Turn::system(self.policy.system_prompt.clone())]
        });
    }

    /// Copy of the session's transcript, empty when the session is unknown.
    pub async fn transcript(&self, id: SessionId) -> Vec<Turn> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the session's transcript.
    pub async fn store(&self, id: SessionId, transcript: Vec<Turn>) {
        self.sessions.lock().await.insert(id, transcript);
    }

    /// Forget the session, returning its last transcript.
    pub async fn end_session(&self, id: SessionId) -> Option<Vec<Turn>> {
        let removed = self.sessions.lock().await.remove(&id);
        if removed.is_some() {
            tracing::debug!(session = %id, "session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Apply [`trim`] with this store's policy.
    pub fn trim(&self, transcript: &[Turn]) -> Vec<Turn> {
        trim(transcript, &self.policy)
    }
}
