//! Completion provider: instructions plus content in, generated text out.

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use serde_json::json;
use thiserror::Error;

/// Errors raised by a completion provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The underlying provider rejected or failed the request.
    #[error("completion request failed: {0}")]
    Provider(String),
}

/// A single completion request.
///
/// `preamble` carries the system-level instructions, `prompt` the user-facing
/// content. `json_output` asks the provider for JSON-shaped structured output;
/// providers that cannot honor it still return plain text, which callers must
/// treat as a shape violation, not a transport failure.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System-level instructions for the model.
    pub preamble: String,
    /// User-facing content.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Optional output token budget.
    pub max_tokens: Option<u64>,
    /// Request JSON-shaped structured output.
    pub json_output: bool,
}

impl CompletionRequest {
    /// Creates a request with temperature 0.2 and no token budget.
    #[must_use]
    pub fn new(preamble: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            prompt: prompt.into(),
            temperature: 0.2,
            max_tokens: None,
            json_output: false,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Requests JSON-shaped structured output.
    #[must_use]
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Generates text completions.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Executes one completion request and returns the generated text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// OpenAI-backed completion provider.
pub struct OpenAiCompletionProvider {
    client: rig::providers::openai::Client,
    model: String,
}

impl OpenAiCompletionProvider {
    /// Builds a provider for `model` using credentials from the environment
    /// (`OPENAI_API_KEY`).
    #[must_use]
    pub fn from_env(model: &str) -> Self {
        Self {
            client: rig::providers::openai::Client::from_env(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let mut builder = self
            .client
            .agent(&self.model)
            .preamble(&request.preamble)
            .temperature(request.temperature);
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if request.json_output {
            builder = builder.additional_params(json!({
                "response_format": {"type": "json_object"}
            }));
        }
        builder
            .build()
            .prompt(request.prompt)
            .await
            .map_err(|err| CompletionError::Provider(err.to_string()))
    }
}
