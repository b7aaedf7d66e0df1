//! Per-session vector index storage.
//!
//! Each ingested document gets its own on-disk index scoped to exactly that
//! document's chunks, so similarity search never crosses session boundaries.
//! The [`ChunkSearch`] trait is the seam services depend on; the SQLite
//! implementation in [`sqlite`] is the production backend.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::EmbeddingError;

pub use sqlite::SqliteChunkIndex;

/// Errors raised by a vector index backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage engine failed.
    #[error("vector index storage failure: {0}")]
    Storage(String),

    /// Embedding the content to index or query failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// A chunk as persisted in a session's index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Zero-based position of this chunk within the source document.
    pub position: usize,
    /// Display name of the originating document.
    pub source: String,
    /// The chunk text.
    pub content: String,
}

/// A chunk returned from similarity search, most similar first.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    /// The matched chunk.
    pub chunk: StoredChunk,
    /// Cosine similarity in `[-1, 1]`, higher is closer.
    pub score: f32,
}

/// Similarity search over one session's chunks.
#[async_trait]
pub trait ChunkSearch: Send + Sync {
    /// Returns up to `top_k` chunks most similar to `query`, most similar
    /// first.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, StoreError>;
}
