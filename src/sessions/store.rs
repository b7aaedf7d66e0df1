//! In-memory session store with capacity-bounded eviction.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::fs;

use super::{DocumentSession, SessionError};

/// Process-wide mapping from session identifier to session record.
///
/// Constructed once at startup and injected into every service that needs
/// it. Lookups fail with [`SessionError::NotFound`]; teardown removes both
/// the record and its persisted storage directory and is an idempotent no-op
/// when the identifier is already gone.
///
/// The store is capacity-bounded: inserting past `capacity` evicts the
/// oldest session first. The returned eviction list lets the caller delete
/// the evicted sessions' storage without holding the store lock across I/O.
pub struct SessionStore {
    sessions: RwLock<FxHashMap<String, Arc<DocumentSession>>>,
    capacity: usize,
}

impl SessionStore {
    /// Creates a store holding at most `capacity` live sessions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(FxHashMap::default()),
            capacity,
        }
    }

    /// Registers a session, evicting the oldest sessions if the store is at
    /// capacity. Returns the evicted records; their storage directories have
    /// NOT been removed yet.
    pub fn insert(&self, session: DocumentSession) -> Vec<Arc<DocumentSession>> {
        let mut sessions = self.sessions.write();
        let mut evicted = Vec::new();
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .values()
                .min_by_key(|existing| existing.created_at())
                .map(|existing| existing.id().to_string());
            match oldest {
                Some(id) => {
                    if let Some(old) = sessions.remove(&id) {
                        evicted.push(old);
                    }
                }
                None => break,
            }
        }
        sessions.insert(session.id().to_string(), Arc::new(session));
        evicted
    }

    /// Looks up a session by identifier.
    pub fn get(&self, session_id: &str) -> Result<Arc<DocumentSession>, SessionError> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound {
                session_id: session_id.to_string(),
            })
    }

    /// Tears down a session: drops the record and deletes its storage
    /// directory. Returns `true` when a live session was removed, `false`
    /// when the identifier was already absent.
    pub async fn remove(&self, session_id: &str) -> Result<bool, SessionError> {
        let removed = self.sessions.write().remove(session_id);
        let Some(session) = removed else {
            return Ok(false);
        };
        remove_session_storage(&session).await?;
        tracing::info!(session = %session_id, "session torn down");
        Ok(true)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` when no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Identifiers of all live sessions, in no particular order.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

/// Deletes a session's storage directory, treating an already-missing
/// directory as success.
pub(crate) async fn remove_session_storage(
    session: &DocumentSession,
) -> Result<(), SessionError> {
    match fs::remove_dir_all(session.storage_dir()).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SessionError::Teardown {
            session_id: session.id().to_string(),
            source: err,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{ChunkSearch, ScoredChunk, StoreError};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use uuid::Uuid;

    struct NoopIndex;

    #[async_trait]
    impl ChunkSearch for NoopIndex {
        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn sample_session(dir: PathBuf) -> DocumentSession {
        DocumentSession::new(
            Uuid::new_v4().to_string(),
            "notes.pdf".to_string(),
            vec!["chunk".to_string()],
            Arc::new(NoopIndex),
            dir,
            16,
        )
    }

    #[tokio::test]
    async fn get_after_insert_returns_the_session() {
        let store = SessionStore::new(8);
        let session = sample_session(PathBuf::from("unused"));
        let id = session.id().to_string();
        assert!(store.insert(session).is_empty());

        let found = store.get(&id).unwrap();
        assert_eq!(found.source_name(), "notes.pdf");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_unknown_id_fails_with_not_found() {
        let store = SessionStore::new(8);
        let err = store.get("nope").unwrap_err();
        assert!(matches!(err, SessionError::NotFound { .. }));
    }

    #[tokio::test]
    async fn remove_is_idempotent_and_deletes_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("session_x");
        tokio::fs::create_dir_all(&storage).await.unwrap();
        tokio::fs::write(storage.join("chunks.sqlite"), b"stub")
            .await
            .unwrap();

        let store = SessionStore::new(8);
        let session = sample_session(storage.clone());
        let id = session.id().to_string();
        store.insert(session);

        assert!(store.remove(&id).await.unwrap());
        assert!(!storage.exists());
        assert!(matches!(
            store.get(&id),
            Err(SessionError::NotFound { .. })
        ));

        // Second removal is a no-op.
        assert!(!store.remove(&id).await.unwrap());
    }

    #[tokio::test]
    async fn insert_past_capacity_evicts_the_oldest() {
        let store = SessionStore::new(2);
        let first = sample_session(PathBuf::from("a"));
        let first_id = first.id().to_string();
        store.insert(first);
        store.insert(sample_session(PathBuf::from("b")));

        let evicted = store.insert(sample_session(PathBuf::from("c")));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id(), first_id);
        assert_eq!(store.len(), 2);
        assert!(matches!(
            store.get(&first_id),
            Err(SessionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn session_ids_are_unique_across_many_insertions() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(Uuid::new_v4().to_string()), "uuid collision");
        }
    }
}
