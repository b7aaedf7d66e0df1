//! SQLite-backed vector index, one database file per session.
//!
//! Chunks live in an ordinary `chunks` table; their embeddings live in a
//! `chunk_embeddings` vec0 virtual table joined by rowid. Similarity search
//! uses `vec_distance_cosine` from the sqlite-vec extension, with distance
//! converted to similarity as `1 - distance`.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio_rusqlite::{Connection, ffi, rusqlite};

use crate::providers::EmbeddingProvider;

use super::{ChunkSearch, ScoredChunk, StoreError, StoredChunk};

/// A persisted nearest-neighbor index over one document's chunks.
///
/// Created once at ingestion time via [`SqliteChunkIndex::create`]; the
/// database file under the session's storage directory is the durable form,
/// and [`SqliteChunkIndex::open`] reloads it.
#[derive(Clone)]
pub struct SqliteChunkIndex {
    conn: Connection,
    embedder: Arc<dyn EmbeddingProvider>,
    path: PathBuf,
}

impl SqliteChunkIndex {
    /// Builds a new index at `path` containing every chunk in order, tagged
    /// with `source` metadata, and persists it.
    ///
    /// The embedding provider is invoked once for the whole batch. `chunks`
    /// must be non-empty; ingestion guarantees this.
    pub async fn create(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        source: &str,
        chunks: &[String],
    ) -> Result<Self, StoreError> {
        register_sqlite_vec()?;

        let vectors = embedder.embed_batch(chunks).await?;
        let dims = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| StoreError::Storage("cannot index an empty chunk set".to_string()))?;

        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path.clone())
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))?;

        let source = source.to_string();
        let rows: Vec<(usize, String, String)> = chunks
            .iter()
            .zip(&vectors)
            .enumerate()
            .map(|(position, (content, vector))| {
                serde_json::to_string(vector)
                    .map(|embedding_json| (position, content.clone(), embedding_json))
                    .map_err(|err| StoreError::Storage(err.to_string()))
            })
            .collect::<Result<_, _>>()?;

        conn.call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS chunks (
                    id INTEGER PRIMARY KEY,
                    position INTEGER NOT NULL,
                    source TEXT NOT NULL,
                    content TEXT NOT NULL
                )",
                [],
            )?;
            conn.execute(
                &format!(
                    "CREATE VIRTUAL TABLE IF NOT EXISTS chunk_embeddings USING vec0(embedding float[{dims}])"
                ),
                [],
            )?;

            let tx = conn.transaction()?;
            for (position, content, embedding_json) in rows {
                let id = position as i64 + 1;
                tx.execute(
                    "INSERT INTO chunks (id, position, source, content) VALUES (?1, ?2, ?3, ?4)",
                    (id, position as i64, source.as_str(), content.as_str()),
                )?;
                tx.execute(
                    "INSERT INTO chunk_embeddings (rowid, embedding) VALUES (?1, ?2)",
                    (id, embedding_json.as_str()),
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Storage(err.to_string()))?;

        Ok(Self {
            conn,
            embedder,
            path,
        })
    }

    /// Reloads a previously persisted index from `path`.
    ///
    /// Fails when the file does not hold an index built by
    /// [`SqliteChunkIndex::create`].
    pub async fn open(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, StoreError> {
        register_sqlite_vec()?;

        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StoreError::Storage(format!(
                "no persisted index at {}",
                path.display()
            )));
        }
        let conn = Connection::open(path.clone())
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))?;

        conn.call(|conn| -> rusqlite::Result<()> {
            conn.query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunks'",
                [],
                |_| Ok(()),
            )?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Storage(format!("persisted index is unreadable: {err}")))?;

        Ok(Self {
            conn,
            embedder,
            path,
        })
    }

    /// Path of the database file backing this index.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of chunks held by this index.
    pub async fn chunk_count(&self) -> Result<usize, StoreError> {
        self.conn
            .call(|conn| -> rusqlite::Result<usize> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))
    }
}

#[async_trait]
impl ChunkSearch for SqliteChunkIndex {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        let vector = self.embedder.embed_one(query).await?;
        let embedding_json =
            serde_json::to_string(&vector).map_err(|err| StoreError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| -> rusqlite::Result<Vec<ScoredChunk>> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT c.position, c.source, c.content, \
                     vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                     FROM chunks c \
                     JOIN chunk_embeddings e ON e.rowid = c.id \
                     ORDER BY distance ASC \
                     LIMIT {top_k}"
                ))?;

                let rows = stmt.query_map([&embedding_json], |row| {
                    let chunk = StoredChunk {
                        position: row.get::<_, i64>(0)? as usize,
                        source: row.get(1)?,
                        content: row.get(2)?,
                    };
                    let distance: f32 = row.get(3)?;
                    Ok(ScoredChunk {
                        chunk,
                        score: 1.0 - distance,
                    })
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))
    }
}

/// Registers the sqlite-vec extension for every connection opened by this
/// process. Safe to call repeatedly; registration happens once.
fn register_sqlite_vec() -> Result<(), StoreError> {
    static REGISTRATION: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTRATION
        .get_or_init(|| unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn = transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != ffi::SQLITE_OK {
                Err(format!(
                    "failed to register sqlite-vec extension (code {rc})"
                ))
            } else {
                Ok(())
            }
        })
        .clone()
        .map_err(StoreError::Storage)
}
