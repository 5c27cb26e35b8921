//! Session registry: one workspace, conversation and current-file pointer per
//! session id

use crate::utils::errors::CodepadError;
use crate::workspace::{FileId, Workspace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

pub mod conversation;

pub use conversation::{Conversation, ConversationTurn};

/// Opaque session key handed out by [`SessionStore::create`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// State owned by one session
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub workspace: Workspace,
    pub conversation: Conversation,
    /// File injected into chat prompts when context is requested
    pub current_file: Option<FileId>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            workspace: Workspace::new(),
            conversation: Conversation::new(),
            current_file: None,
            created_at: Utc::now(),
        }
    }

    /// Point chat context at a file of this session's workspace
    pub fn set_current_file(&mut self, id: &FileId) -> Result<(), CodepadError> {
        if !self.workspace.contains_file(id) {
            return Err(CodepadError::not_found(format!("file {}", id)));
        }
        self.current_file = Some(id.clone());
        Ok(())
    }

    /// Delete a file and drop the current-file pointer when it targets it
    pub fn delete_file(&mut self, id: &FileId) -> bool {
        let deleted = self.workspace.delete_file(id);
        if deleted && self.current_file.as_ref() == Some(id) {
            self.current_file = None;
        }
        deleted
    }

    /// Delete a folder and drop a current-file pointer left dangling by it
    pub fn delete_folder(&mut self, name: &str) -> bool {
        let deleted = self.workspace.delete_folder(name);
        if deleted {
            if let Some(current) = &self.current_file {
                if !self.workspace.contains_file(current) {
                    self.current_file = None;
                }
            }
        }
        deleted
    }
}

/// Shared handle to one session; operations on it are serialized
pub type SessionHandle = Arc<Mutex<Session>>;

struct SessionSlot {
    session: SessionHandle,
    last_seen: Instant,
}

/// Owned registry of live sessions.
///
/// Sessions idle for longer than the TTL are swept on [`create`](Self::create)
/// and reported as missing by [`get`](Self::get). A zero TTL disables expiry.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionSlot>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_expired(&self, slot: &SessionSlot, now: Instant) -> bool {
        !self.ttl.is_zero() && now.duration_since(slot.last_seen) > self.ttl
    }

    /// Start a new empty session
    pub async fn create(&self) -> SessionId {
        let id = SessionId::generate();
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, slot| !self.is_expired(slot, now));
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::info!("Expired {} idle session(s)", swept);
        }

        sessions.insert(
            id.clone(),
            SessionSlot {
                session: Arc::new(Mutex::new(Session::new(id.clone()))),
                last_seen: now,
            },
        );
        tracing::debug!("Created session {}", id);
        id
    }

    /// Look up a live session and mark it as used
    pub async fn get(&self, id: &SessionId) -> Result<SessionHandle, CodepadError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(id) {
            Some(slot) => self.is_expired(slot, now),
            None => return Err(CodepadError::session_not_found(id.as_str())),
        };
        if expired {
            sessions.remove(id);
            tracing::debug!("Session {} expired", id);
            return Err(CodepadError::session_not_found(id.as_str()));
        }

        let slot = sessions
            .get_mut(id)
            .ok_or_else(|| CodepadError::session_not_found(id.as_str()))?;
        slot.last_seen = now;
        Ok(slot.session.clone())
    }

    /// Remove a session explicitly
    pub async fn close(&self, id: &SessionId) -> Result<(), CodepadError> {
        match self.sessions.write().await.remove(id) {
            Some(_) => {
                tracing::debug!("Closed session {}", id);
                Ok(())
            }
            None => Err(CodepadError::session_not_found(id.as_str())),
        }
    }

    /// Number of sessions held, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}
