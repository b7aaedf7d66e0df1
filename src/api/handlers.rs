//! Request handlers.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::extract;
use crate::flashcards::{DEFAULT_FLASHCARD_COUNT, Flashcard};

use super::{ApiError, AppState};

pub(super) async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzePdfResponse {
    summary: String,
    keywords: Vec<String>,
    questions: Vec<String>,
    session_id: String,
}

/// Upload a document, analyze it, and open a retrieval session.
pub(super) async fn analyze_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzePdfResponse>, ApiError> {
    tracing::info!("analyze_pdf endpoint called");

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("invalid multipart payload: {err}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::Validation(format!("failed to read file part: {err}")))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::Validation("no file part in the request".to_string()));
    };
    if file_name.is_empty() {
        return Err(ApiError::Validation("no selected file".to_string()));
    }

    // PDF decoding is CPU-bound; keep it off the async workers.
    let text = tokio::task::spawn_blocking(move || extract::pdf_text(&bytes))
        .await
        .map_err(|err| ApiError::Internal {
            message: "Failed to process PDF".to_string(),
            details: err.to_string(),
        })??;

    let analysis = state.analysis.analyze(&text).await?;
    let session_id = state.ingestor.ingest(&text, &file_name).await?;

    Ok(Json(AnalyzePdfResponse {
        summary: analysis.summary,
        keywords: analysis.keywords,
        questions: analysis.questions,
        session_id,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatRequest {
    session_id: Option<String>,
    question: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatResponse {
    answer: String,
}

/// Ask a question against an open session.
pub(super) async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::info!("chat endpoint called");

    let session_id = require_field(request.session_id, "session_id")?;
    let question = require_field(request.question, "question")?;

    let answer = state.chat.answer(&session_id, &question).await?;
    Ok(Json(ChatResponse { answer }))
}

#[derive(Debug, Deserialize)]
pub(super) struct FlashcardRequest {
    session_id: Option<String>,
    count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct FlashcardResponse {
    flashcards: Vec<Flashcard>,
    degraded: bool,
}

/// Generate flashcards from an open session's document.
pub(super) async fn generate_flashcards(
    State(state): State<AppState>,
    Json(request): Json<FlashcardRequest>,
) -> Result<Json<FlashcardResponse>, ApiError> {
    tracing::info!("generate_flashcards endpoint called");

    let session_id = require_field(request.session_id, "session_id")?;
    let count = request.count.unwrap_or(DEFAULT_FLASHCARD_COUNT);
    if count == 0 {
        return Err(ApiError::Validation("count must be positive".to_string()));
    }

    let outcome = state.flashcards.generate(&session_id, count).await?;
    Ok(Json(FlashcardResponse {
        degraded: outcome.is_degraded(),
        flashcards: outcome.cards().to_vec(),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct SessionInfoResponse {
    session_id: String,
    source_name: String,
    chunk_count: usize,
    created_at: DateTime<Utc>,
    status: &'static str,
}

/// Session metadata.
pub(super) async fn session_info(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionInfoResponse>, ApiError> {
    let session = state.store.get(&session_id)?;
    Ok(Json(SessionInfoResponse {
        session_id: session.id().to_string(),
        source_name: session.source_name().to_string(),
        chunk_count: session.chunks().len(),
        created_at: session.created_at(),
        status: "active",
    }))
}

/// Session teardown. Idempotent: deleting an unknown session still succeeds.
pub(super) async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.remove(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Extracts a required, non-empty string field from a JSON request.
fn require_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::Validation(format!("{name} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_field_accepts_non_empty_values() {
        assert_eq!(
            require_field(Some("abc".to_string()), "session_id").unwrap(),
            "abc"
        );
    }

    #[test]
    fn require_field_rejects_missing_and_blank_values() {
        assert!(require_field(None, "session_id").is_err());
        assert!(require_field(Some("   ".to_string()), "question").is_err());
    }
}
