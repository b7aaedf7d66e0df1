//! Flashcard generation from a session's leading chunks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::{CompletionError, CompletionProvider, CompletionRequest};
use crate::sessions::{SessionError, SessionStore};
use crate::util::truncate_chars;

/// Default number of flashcards requested per generation.
pub const DEFAULT_FLASHCARD_COUNT: usize = 6;

/// Number of leading chunks sampled as generation material.
const SAMPLE_CHUNKS: usize = 5;
/// Character cap on the sampled material.
const SAMPLE_CHAR_LIMIT: usize = 3000;

/// Errors raised while generating flashcards.
#[derive(Debug, Error)]
pub enum FlashcardError {
    /// The session identifier is unknown.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The completion provider failed outright.
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// A single study flashcard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// The prompt side of the card.
    pub question: String,
    /// The answer side of the card.
    pub answer: String,
}

/// Result of a flashcard generation.
///
/// Degradation is observable rather than swallowed: when the model does not
/// honor the requested output shape, the caller receives the fixed fallback
/// set tagged with the reason instead of a silent substitute.
#[derive(Clone, Debug)]
pub enum FlashcardOutcome {
    /// The model returned well-formed cards.
    Generated(Vec<Flashcard>),
    /// The model's output could not be parsed; these are the fixed fallback
    /// cards.
    Fallback {
        /// Why parsing failed.
        reason: String,
        /// The fallback cards.
        cards: Vec<Flashcard>,
    },
}

impl FlashcardOutcome {
    /// The cards to hand to the caller, generated or fallback.
    pub fn cards(&self) -> &[Flashcard] {
        match self {
            Self::Generated(cards) => cards,
            Self::Fallback { cards, .. } => cards,
        }
    }

    /// Returns `true` when the fallback path was taken.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

const FLASHCARD_PREAMBLE: &str = "\
You create study flashcards from academic content. Respond only with JSON.";

/// Generates study flashcards from a session's document.
pub struct FlashcardService {
    store: Arc<SessionStore>,
    completion: Arc<dyn CompletionProvider>,
}

impl FlashcardService {
    /// Creates a flashcard service.
    #[must_use]
    pub fn new(store: Arc<SessionStore>, completion: Arc<dyn CompletionProvider>) -> Self {
        Self { store, completion }
    }

    /// Generates `count` flashcards for the document behind `session_id`.
    ///
    /// Only structured-output shape violations degrade to the fallback set;
    /// provider transport failures surface as [`FlashcardError::Completion`].
    pub async fn generate(
        &self,
        session_id: &str,
        count: usize,
    ) -> Result<FlashcardOutcome, FlashcardError> {
        let session = self.store.get(session_id)?;

        let joined = session
            .chunks()
            .iter()
            .take(SAMPLE_CHUNKS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let sample = truncate_chars(&joined, SAMPLE_CHAR_LIMIT);

        let prompt = format!(
            "Based on the following academic content, create {count} flashcards for studying.\n\
             Each flashcard should have a \"question\" and \"answer\".\n\
             Focus on key concepts, definitions, and important facts.\n\
             Vary the question types (definitions, explanations, applications).\n\n\
             Return as JSON with a \"flashcards\" array containing objects with \
             \"question\" and \"answer\" fields.\n\n\
             Content: {sample}"
        );

        let raw = self
            .completion
            .complete(
                CompletionRequest::new(FLASHCARD_PREAMBLE, prompt)
                    .with_temperature(0.2)
                    .with_json_output(),
            )
            .await?;

        match parse_flashcards(&raw) {
            Ok(cards) => {
                tracing::debug!(session = %session_id, cards = cards.len(), "flashcards generated");
                Ok(FlashcardOutcome::Generated(cards))
            }
            Err(reason) => {
                tracing::warn!(
                    session = %session_id,
                    reason = %reason,
                    "flashcard output was not well-formed; using fallback cards"
                );
                Ok(FlashcardOutcome::Fallback {
                    reason,
                    cards: fallback_flashcards(),
                })
            }
        }
    }
}

/// Parses the model's structured output. A missing or empty `flashcards`
/// array counts as a shape violation.
fn parse_flashcards(raw: &str) -> Result<Vec<Flashcard>, String> {
    #[derive(Deserialize)]
    struct Payload {
        flashcards: Vec<Flashcard>,
    }

    let payload: Payload = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    if payload.flashcards.is_empty() {
        return Err("flashcards array is empty".to_string());
    }
    Ok(payload.flashcards)
}

/// The fixed degradation set returned when structured output cannot be
/// parsed.
fn fallback_flashcards() -> Vec<Flashcard> {
    vec![
        Flashcard {
            question: "What are the main topics covered in this document?".to_string(),
            answer: "Please refer to the document summary for main topics.".to_string(),
        },
        Flashcard {
            question: "What are the key concepts to remember?".to_string(),
            answer: "Review the keywords section for important concepts.".to_string(),
        },
    ]
}
