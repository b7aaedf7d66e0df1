//! Error-to-response mapping for the HTTP boundary.
//!
//! Every failure crossing the boundary is logged with context and rendered
//! as the envelope `{"error": <message>, "details": <cause>}`. Validation
//! failures map to 400, unknown sessions to 404, everything else to 500.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::chat::AnswerError;
use crate::extract::ExtractionError;
use crate::flashcards::FlashcardError;
use crate::ingestion::IngestError;
use crate::sessions::SessionError;

/// JSON error envelope returned for every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// String form of the underlying cause.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub details: String,
}

/// Errors surfaced at the request boundary.
#[derive(Debug)]
pub enum ApiError {
    /// The request was malformed (missing fields, missing file part).
    Validation(String),
    /// The referenced session does not exist.
    SessionNotFound(String),
    /// An internal processing failure.
    Internal {
        /// Stable human-readable message for the route.
        message: String,
        /// String form of the cause.
        details: String,
    },
}

impl ApiError {
    fn internal(message: &str, details: impl ToString) -> Self {
        Self::Internal {
            message: message.to_string(),
            details: details.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(message) => {
                tracing::warn!(error = %message, "rejected invalid request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: message,
                        details: String::new(),
                    },
                )
            }
            ApiError::SessionNotFound(session_id) => {
                tracing::warn!(session = %session_id, "request referenced unknown session");
                (
                    StatusCode::NOT_FOUND,
                    ErrorBody {
                        error: "Session not found. Please upload a document first.".to_string(),
                        details: format!("session not found: {session_id}"),
                    },
                )
            }
            ApiError::Internal { message, details } => {
                tracing::error!(error = %message, details = %details, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: message,
                        details,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        ApiError::internal("Failed to process PDF", err)
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        ApiError::internal("Failed to process PDF", err)
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::internal("Failed to process PDF", err)
    }
}

impl From<AnswerError> for ApiError {
    fn from(err: AnswerError) -> Self {
        match err {
            AnswerError::Session(SessionError::NotFound { session_id }) => {
                ApiError::SessionNotFound(session_id)
            }
            other => ApiError::internal("Failed to process question", other),
        }
    }
}

impl From<FlashcardError> for ApiError {
    fn from(err: FlashcardError) -> Self {
        match err {
            FlashcardError::Session(SessionError::NotFound { session_id }) => {
                ApiError::SessionNotFound(session_id)
            }
            other => ApiError::internal("Failed to generate flashcards", other),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { session_id } => ApiError::SessionNotFound(session_id),
            other => ApiError::internal("Failed to manage session", other),
        }
    }
}
