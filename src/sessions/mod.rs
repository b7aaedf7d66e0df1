//! Document retrieval sessions and the process-wide session store.
//!
//! A session is the unit of document context: the chunked text of one
//! uploaded document, its dedicated retrieval index, and the conversation
//! held against it, addressed by an opaque identifier. Sessions are created
//! by ingestion, read by question answering and flashcard generation, and
//! destroyed only by explicit teardown.

mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use crate::message::Transcript;
use crate::stores::ChunkSearch;

pub use store::SessionStore;
pub(crate) use store::remove_session_storage;

/// Errors raised by session lookup and teardown.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No live session has the given identifier.
    #[error("session not found: {session_id}")]
    NotFound {
        /// The unknown identifier.
        session_id: String,
    },

    /// Removing a session's persisted storage failed.
    #[error("failed to remove session storage for {session_id}: {source}")]
    Teardown {
        /// The session being torn down.
        session_id: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// One document's retrieval context.
///
/// Immutable after creation except for the conversation transcript, which is
/// guarded by a per-session mutex so concurrent questions against the same
/// session cannot interleave their turn ordering.
pub struct DocumentSession {
    id: String,
    source_name: String,
    chunks: Vec<String>,
    index: Arc<dyn ChunkSearch>,
    storage_dir: PathBuf,
    created_at: DateTime<Utc>,
    transcript: Mutex<Transcript>,
}

impl DocumentSession {
    /// Assembles a session record. Called by ingestion once every durable
    /// step has succeeded.
    #[must_use]
    pub fn new(
        id: String,
        source_name: String,
        chunks: Vec<String>,
        index: Arc<dyn ChunkSearch>,
        storage_dir: PathBuf,
        history_limit: usize,
    ) -> Self {
        Self {
            id,
            source_name,
            chunks,
            index,
            storage_dir,
            created_at: Utc::now(),
            transcript: Mutex::new(Transcript::new(history_limit)),
        }
    }

    /// The session's opaque identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name of the originating document.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The document's chunks, in document order.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// The retrieval index scoped to this session's chunks.
    pub fn index(&self) -> &Arc<dyn ChunkSearch> {
        &self.index
    }

    /// Directory holding this session's persisted index.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Runs `f` with exclusive access to the session's transcript.
    pub fn with_transcript<R>(&self, f: impl FnOnce(&mut Transcript) -> R) -> R {
        let mut transcript = self.transcript.lock();
        f(&mut transcript)
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("id", &self.id)
            .field("source_name", &self.source_name)
            .field("chunks", &self.chunks.len())
            .field("storage_dir", &self.storage_dir)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
