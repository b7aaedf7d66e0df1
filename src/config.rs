//! Service configuration resolved from the environment.
//!
//! All knobs are read once at startup from `LECTERN_*` environment variables
//! (a `.env` file is honored when present) and injected into the services at
//! construction time. Nothing in the crate reads configuration from hidden
//! statics after startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was present but failed to parse.
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse {
        /// Environment variable key.
        key: &'static str,
        /// Description of the parse failure.
        message: String,
    },

    /// The resolved values are mutually inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration for the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Root directory for per-session storage.
    pub data_dir: PathBuf,
    /// Completion model identifier passed to the LLM provider.
    pub completion_model: String,
    /// Embedding model identifier passed to the LLM provider.
    pub embedding_model: String,
    /// Maximum chunk length, in characters.
    pub chunk_size: usize,
    /// Overlap carried between adjacent chunks, in characters.
    pub chunk_overlap: usize,
    /// Maximum number of transcript turns kept per session.
    pub history_limit: usize,
    /// Maximum number of live sessions before the oldest is evicted.
    pub session_capacity: usize,
    /// Number of chunks retrieved per question.
    pub answer_top_k: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            data_dir: PathBuf::from("./lectern_data"),
            completion_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            history_limit: 64,
            session_capacity: 128,
            answer_top_k: 3,
        }
    }
}

impl ServiceConfig {
    /// Resolves the configuration from the environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            bind_addr: env_parse("LECTERN_BIND_ADDR", defaults.bind_addr)?,
            data_dir: std::env::var("LECTERN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            completion_model: env_string("LECTERN_COMPLETION_MODEL", defaults.completion_model),
            embedding_model: env_string("LECTERN_EMBEDDING_MODEL", defaults.embedding_model),
            chunk_size: env_parse("LECTERN_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: env_parse("LECTERN_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            history_limit: env_parse("LECTERN_HISTORY_LIMIT", defaults.history_limit)?,
            session_capacity: env_parse("LECTERN_SESSION_CAPACITY", defaults.session_capacity)?,
            answer_top_k: env_parse("LECTERN_ANSWER_TOP_K", defaults.answer_top_k)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.answer_top_k == 0 {
            return Err(ConfigError::Invalid("answer_top_k must be positive".into()));
        }
        if self.session_capacity == 0 {
            return Err(ConfigError::Invalid(
                "session_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn env_string(key: &'static str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|err: T::Err| ConfigError::EnvParse {
            key,
            message: err.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.answer_top_k, 3);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let config = ServiceConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..ServiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
