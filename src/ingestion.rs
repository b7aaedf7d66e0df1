//! Document ingestion: chunk, embed, index, persist, register.
//!
//! Ingestion is atomic from the store's point of view: the session record is
//! only registered after chunking, embedding, and index persistence have all
//! succeeded. On failure the partially written session directory is removed
//! and nothing is registered.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::chunking::TextChunker;
use crate::providers::EmbeddingProvider;
use crate::sessions::{DocumentSession, SessionStore};
use crate::stores::{SqliteChunkIndex, StoreError};

/// Errors raised while ingesting a document.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Chunking produced nothing to index.
    #[error("no chunks were generated from '{source_name}'")]
    EmptyDocument {
        /// Display name of the offending document.
        source_name: String,
    },

    /// Building or persisting the session's vector index failed.
    #[error("failed to build the session index: {0}")]
    Index(#[from] StoreError),

    /// Preparing the session's storage directory failed.
    #[error("failed to prepare session storage: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns raw document text into a registered, queryable session.
pub struct DocumentIngestor {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<SessionStore>,
    data_dir: PathBuf,
    history_limit: usize,
}

impl DocumentIngestor {
    /// Creates an ingestor writing session storage under `data_dir`.
    #[must_use]
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<SessionStore>,
        data_dir: PathBuf,
        history_limit: usize,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            data_dir,
            history_limit,
        }
    }

    /// Ingests `text` under the display name `source_name` and returns the
    /// fresh session identifier.
    pub async fn ingest(&self, text: &str, source_name: &str) -> Result<String, IngestError> {
        let chunks = self.chunker.split(text);
        if chunks.is_empty() {
            tracing::warn!(source = %source_name, "document produced no chunks");
            return Err(IngestError::EmptyDocument {
                source_name: source_name.to_string(),
            });
        }

        let session_id = Uuid::new_v4().to_string();
        let storage_dir = self.data_dir.join(format!("session_{session_id}"));
        fs::create_dir_all(&storage_dir).await?;

        let index_path = storage_dir.join("chunks.sqlite");
        let index = match SqliteChunkIndex::create(
            &index_path,
            self.embedder.clone(),
            source_name,
            &chunks,
        )
        .await
        {
            Ok(index) => index,
            Err(err) => {
                // Roll back the durable side so no partial session survives.
                if let Err(cleanup_err) = fs::remove_dir_all(&storage_dir).await {
                    tracing::warn!(
                        session = %session_id,
                        error = %cleanup_err,
                        "failed to clean up session storage after ingestion failure"
                    );
                }
                return Err(err.into());
            }
        };

        let chunk_count = chunks.len();
        let session = DocumentSession::new(
            session_id.clone(),
            source_name.to_string(),
            chunks,
            Arc::new(index),
            storage_dir,
            self.history_limit,
        );

        for evicted in self.store.insert(session) {
            tracing::info!(
                session = %evicted.id(),
                source = %evicted.source_name(),
                "evicting oldest session to stay within capacity"
            );
            if let Err(err) = crate::sessions::remove_session_storage(&evicted).await {
                tracing::warn!(session = %evicted.id(), error = %err, "failed to remove evicted session storage");
            }
        }

        tracing::info!(
            session = %session_id,
            source = %source_name,
            chunks = chunk_count,
            "document ingested"
        );
        Ok(session_id)
    }
}
