//! Embedding provider: text in, fixed-length vector out.

use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel;
use thiserror::Error;

/// Errors raised by an embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The underlying provider rejected or failed the request.
    #[error("embedding request failed: {0}")]
    Provider(String),

    /// The provider returned a different number of vectors than inputs.
    #[error("embedding provider returned {got} vectors for {expected} inputs")]
    CountMismatch {
        /// Number of input texts.
        expected: usize,
        /// Number of vectors returned.
        got: usize,
    },
}

/// Produces embedding vectors for text.
///
/// Implementations must be deterministic per input within a single index's
/// lifetime: the same text embedded for indexing and for querying has to land
/// in the same vector space.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_batch(&texts).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }
}

/// OpenAI-backed embedding provider.
pub struct OpenAiEmbeddingProvider {
    model: rig::providers::openai::EmbeddingModel,
}

impl OpenAiEmbeddingProvider {
    /// Builds a provider for `model_name` using credentials from the
    /// environment (`OPENAI_API_KEY`).
    #[must_use]
    pub fn from_env(model_name: &str) -> Self {
        let client = rig::providers::openai::Client::from_env();
        Self {
            model: client.embedding_model(model_name),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self
            .model
            .embed_texts(texts.to_vec())
            .await
            .map_err(|err| EmbeddingError::Provider(err.to_string()))?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: embeddings.len(),
            });
        }
        Ok(embeddings
            .into_iter()
            .map(|embedding| embedding.vec.into_iter().map(|v| v as f32).collect())
            .collect())
    }
}

/// Deterministic offline embedding provider for tests and local runs.
///
/// Vectors are derived from a stable hash of the input text, so identical
/// texts always embed identically and distinct texts almost never collide.
/// There is no semantic signal here; retrieval quality is not the point.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dims: usize,
}

impl MockEmbeddingProvider {
    /// Creates a provider emitting 16-dimensional vectors.
    #[must_use]
    pub fn new() -> Self {
        Self { dims: 16 }
    }

    /// Creates a provider emitting vectors of the given dimensionality.
    #[must_use]
    pub fn with_dims(dims: usize) -> Self {
        Self { dims }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        for byte in text.bytes() {
            state = state.wrapping_mul(0x100_0000_01B3).wrapping_add(u64::from(byte));
        }
        (0..self.dims)
            .map(|_| {
                // splitmix64 step, mapped into [-1, 1]
                state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
                let mut z = state;
                z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
                z ^= z >> 31;
                (z as f64 / u64::MAX as f64 * 2.0 - 1.0) as f32
            })
            .collect()
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "Hello world".to_string(),
            "Goodbye world".to_string(),
            "Hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second, "mock embeddings should be deterministic");
        assert_eq!(first[0], first[2], "identical text, identical embedding");
        assert_ne!(first[0], first[1], "distinct text, distinct embedding");
    }

    #[tokio::test]
    async fn mock_embeddings_have_requested_dims() {
        let provider = MockEmbeddingProvider::with_dims(8);
        let vector = provider.embed_one("dimensions").await.unwrap();
        assert_eq!(vector.len(), 8);
    }
}
