//! Question answering against a session's document.

use std::sync::Arc;

use thiserror::Error;

use crate::providers::{CompletionError, CompletionProvider, CompletionRequest};
use crate::sessions::{SessionError, SessionStore};
use crate::stores::{ScoredChunk, StoreError};

/// Errors raised while answering a question.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The session identifier is unknown.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Retrieving context from the session's index failed.
    #[error("failed to retrieve document context: {0}")]
    Retrieval(#[from] StoreError),

    /// The completion provider failed.
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

const ANSWER_PREAMBLE: &str = "\
You are a lecturer assistant in a conversation with a student, answering \
questions about a provided document.

Instructions:
- Use mainly information from the provided context.
- If the answer is not in the context, say that you don't have enough \
information to answer the question.
- Provide specific examples or quotes when relevant.
- Be friendly, helpful, thorough but concise.";

/// Answers natural-language questions from a session's retrieved context.
pub struct ChatService {
    store: Arc<SessionStore>,
    completion: Arc<dyn CompletionProvider>,
    top_k: usize,
}

impl ChatService {
    /// Creates a service retrieving `top_k` chunks per question.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        completion: Arc<dyn CompletionProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            completion,
            top_k,
        }
    }

    /// Answers `question` against the document behind `session_id`.
    ///
    /// On success the question and answer are appended, in that order, to
    /// the session's transcript.
    pub async fn answer(&self, session_id: &str, question: &str) -> Result<String, AnswerError> {
        let session = self.store.get(session_id)?;

        let retrieved = session.index().search(question, self.top_k).await?;
        let history = session.with_transcript(|transcript| transcript.render());
        let prompt = build_prompt(&retrieved, question, &history);

        let answer = self
            .completion
            .complete(CompletionRequest::new(ANSWER_PREAMBLE, prompt).with_temperature(0.2))
            .await?;

        session.with_transcript(|transcript| transcript.record_exchange(question, &answer));

        tracing::debug!(
            session = %session_id,
            retrieved = retrieved.len(),
            "question answered"
        );
        Ok(answer)
    }
}

/// Assembles the completion prompt: retrieved context, the question, and the
/// rendered conversation so far.
fn build_prompt(retrieved: &[ScoredChunk], question: &str, history: &str) -> String {
    let mut context = String::new();
    for scored in retrieved {
        if !context.is_empty() {
            context.push_str("\n\n---\n\n");
        }
        context.push_str(&scored.chunk.content);
    }

    format!(
        "<context>\n{context}\n</context>\n\n\
         <question>\n{question}\n</question>\n\n\
         <chat_history>\n{history}\n</chat_history>"
    )
}
