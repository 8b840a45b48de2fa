//! Session transport for setup pipelines
//!
//! Records are kept server-side and addressed by an opaque session id, so
//! the client never holds anything it could tamper with.

pub mod record;

pub use record::SessionRecord;

use crate::core::error::PipelineError;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Well-known key the pipeline record is stored under
pub const SESSION_KEY: &str = "integration.setup";

/// Trait for session transports
#[async_trait::async_trait]
pub trait SessionTransport: Send + Sync {
    /// Read the value stored under `key` for a session
    async fn read(&self, session_id: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value stored under `key` for a session
    async fn write(&self, session_id: &str, key: &str, data: Vec<u8>) -> Result<()>;

    /// Remove the value stored under `key` (idempotent)
    async fn clear(&self, session_id: &str, key: &str) -> Result<()>;
}

/// Generate a fresh opaque session id
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

struct SessionEntry {
    data: Vec<u8>,
    touched_at: DateTime<Utc>,
}

/// Longest TTL honoured (ten years)
const MAX_TTL_SECS: u64 = 315_360_000;

/// In-memory session store with expiry
pub struct InMemorySessionStore {
    entries: tokio::sync::RwLock<HashMap<(String, String), SessionEntry>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    /// Create a store whose entries expire `ttl_secs` after their last write
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: tokio::sync::RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.touched_at) > self.ttl
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(86_400)
    }
}

#[async_trait::async_trait]
impl SessionTransport for InMemorySessionStore {
    async fn read(&self, session_id: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let lookup = (session_id.to_string(), key.to_string());
        let mut entries = self.entries.write().await;
        let expired = match entries.get(&lookup) {
            Some(entry) if !self.is_expired(entry, Utc::now()) => {
                return Ok(Some(entry.data.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(&lookup);
        }
        Ok(None)
    }

    async fn write(&self, session_id: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            (session_id.to_string(), key.to_string()),
            SessionEntry {
                data,
                touched_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn clear(&self, session_id: &str, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&(session_id.to_string(), key.to_string()));
        Ok(())
    }
}

/// A request's view of its session
///
/// Tracks whether anything was written so the web layer knows to hand the
/// session id back to the client.
#[derive(Clone)]
pub struct SessionHandle {
    transport: Arc<dyn SessionTransport>,
    session_id: String,
    modified: bool,
}

impl SessionHandle {
    pub fn new(transport: Arc<dyn SessionTransport>, session_id: impl Into<String>) -> Self {
        Self {
            transport,
            session_id: session_id.into(),
            modified: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the session was written or cleared during this request
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Read the raw pipeline record
    pub async fn read(&self) -> Result<Option<Vec<u8>>, PipelineError> {
        self.transport
            .read(&self.session_id, SESSION_KEY)
            .await
            .map_err(PipelineError::Transport)
    }

    /// Replace the pipeline record
    pub async fn write(&mut self, record: &SessionRecord) -> Result<(), PipelineError> {
        let data = record.encode()?;
        self.transport
            .write(&self.session_id, SESSION_KEY, data)
            .await
            .map_err(PipelineError::Transport)?;
        self.modified = true;
        Ok(())
    }

    /// Remove the pipeline record
    pub async fn clear(&mut self) -> Result<(), PipelineError> {
        self.transport
            .clear(&self.session_id, SESSION_KEY)
            .await
            .map_err(PipelineError::Transport)?;
        self.modified = true;
        Ok(())
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("modified", &self.modified)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_clear() {
        let store = InMemorySessionStore::new(60);
        assert!(store.read("s1", SESSION_KEY).await.unwrap().is_none());

        store.write("s1", SESSION_KEY, b"data".to_vec()).await.unwrap();
        assert_eq!(
            store.read("s1", SESSION_KEY).await.unwrap(),
            Some(b"data".to_vec())
        );
        // Sessions are isolated
        assert!(store.read("s2", SESSION_KEY).await.unwrap().is_none());

        store.clear("s1", SESSION_KEY).await.unwrap();
        store.clear("s1", SESSION_KEY).await.unwrap();
        assert!(store.read("s1", SESSION_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_absent() {
        let store = InMemorySessionStore::new(0);
        store.write("s1", SESSION_KEY, b"data".to_vec()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert!(store.read("s1", SESSION_KEY).await.unwrap().is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemorySessionStore::new(0);
        store.write("s1", SESSION_KEY, b"a".to_vec()).await.unwrap();
        store.write("s2", SESSION_KEY, b"b".to_vec()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert_eq!(store.purge_expired().await, 2);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_handle_tracks_modification() {
        let store: Arc<dyn SessionTransport> = Arc::new(InMemorySessionStore::default());
        let mut handle = SessionHandle::new(store, new_session_id());
        assert!(!handle.is_modified());
        assert!(handle.read().await.unwrap().is_none());

        handle.clear().await.unwrap();
        assert!(handle.is_modified());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
        assert_eq!(new_session_id().len(), 32);
    }
}
