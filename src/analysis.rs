//! Whole-document analysis: summary, keywords, and study questions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::{CompletionError, CompletionProvider, CompletionRequest};
use crate::util::truncate_chars;

/// Errors raised while analyzing a document.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The completion provider failed.
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Structured result of a document analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// Concise summary of the document.
    pub summary: String,
    /// Key terms and concepts.
    pub keywords: Vec<String>,
    /// Study questions testing understanding.
    pub questions: Vec<String>,
}

const ANALYSIS_PREAMBLE: &str = "\
Analyze the following academic text and provide:
1. A concise summary (2-3 sentences)
2. Key terms and concepts (5-8 keywords)
3. Study questions that test understanding (4-6 questions)

Provide your response in JSON format with 'summary', 'keywords', and \
'questions' fields. Make questions varied in difficulty and type (factual, \
analytical, application-based).";

const FALLBACK_PREAMBLE: &str = "You summarize academic documents.";

/// Maximum characters of text sent to the degraded summary pass.
const FALLBACK_EXCERPT_CHARS: usize = 2000;

/// Produces a summary/keywords/questions analysis of an uploaded document.
pub struct AnalysisService {
    completion: Arc<dyn CompletionProvider>,
}

impl AnalysisService {
    /// Creates an analysis service.
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// Analyzes `text`.
    ///
    /// When the model's JSON cannot be parsed, a degraded second pass asks
    /// for a plain summary; when even that fails, a static placeholder
    /// analysis is returned. A failure of the first completion call itself
    /// surfaces as [`AnalysisError`].
    pub async fn analyze(&self, text: &str) -> Result<DocumentAnalysis, AnalysisError> {
        let raw = self
            .completion
            .complete(
                CompletionRequest::new(ANALYSIS_PREAMBLE, format!("Text to analyze:\n\n{text}"))
                    .with_temperature(0.3)
                    .with_max_tokens(1500)
                    .with_json_output(),
            )
            .await?;

        match parse_analysis(&raw) {
            Some(analysis) => Ok(analysis),
            None => {
                tracing::warn!("analysis output was not valid JSON; falling back to plain summary");
                Ok(self.fallback(text).await)
            }
        }
    }

    /// Degraded path: plain summary of a bounded excerpt plus generic
    /// keywords and questions.
    async fn fallback(&self, text: &str) -> DocumentAnalysis {
        let excerpt = truncate_chars(text, FALLBACK_EXCERPT_CHARS);
        let request = CompletionRequest::new(
            FALLBACK_PREAMBLE,
            format!("Summarize this text in 2-3 sentences: {excerpt}"),
        )
        .with_temperature(0.3)
        .with_max_tokens(200);

        match self.completion.complete(request).await {
            Ok(summary) => DocumentAnalysis {
                summary,
                keywords: ["analysis", "document", "content"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                questions: vec!["What are the main concepts in this document?".to_string()],
            },
            Err(err) => {
                tracing::error!(error = %err, "fallback analysis failed");
                DocumentAnalysis {
                    summary: "Document analysis unavailable".to_string(),
                    keywords: Vec::new(),
                    questions: Vec::new(),
                }
            }
        }
    }
}

/// Parses the model's JSON, tolerating missing fields the way a best-effort
/// reader should.
fn parse_analysis(raw: &str) -> Option<DocumentAnalysis> {
    #[derive(Deserialize)]
    struct RawAnalysis {
        summary: Option<String>,
        keywords: Option<Vec<String>>,
        questions: Option<Vec<String>>,
    }

    let parsed: RawAnalysis = serde_json::from_str(raw).ok()?;
    Some(DocumentAnalysis {
        summary: parsed
            .summary
            .unwrap_or_else(|| "No summary available".to_string()),
        keywords: parsed.keywords.unwrap_or_default(),
        questions: parsed.questions.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_json_parses_fully() {
        let raw = r#"{
            "summary": "Cells make energy.",
            "keywords": ["mitochondria", "ATP"],
            "questions": ["What produces ATP?"]
        }"#;
        let analysis = parse_analysis(raw).unwrap();
        assert_eq!(analysis.summary, "Cells make energy.");
        assert_eq!(analysis.keywords.len(), 2);
        assert_eq!(analysis.questions.len(), 1);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let analysis = parse_analysis(r#"{"keywords": ["one"]}"#).unwrap();
        assert_eq!(analysis.summary, "No summary available");
        assert_eq!(analysis.keywords, vec!["one".to_string()]);
        assert!(analysis.questions.is_empty());
    }

    #[test]
    fn plain_text_does_not_parse() {
        assert!(parse_analysis("here is a summary").is_none());
    }
}
