//! HTTP surface for the document question-answering service.
//!
//! Routes:
//!
//! | Method | Path                       | Purpose                             |
//! |--------|----------------------------|-------------------------------------|
//! | GET    | `/api/health`              | Liveness probe                      |
//! | POST   | `/api/analyze_pdf`         | Upload + analyze + create session   |
//! | POST   | `/api/chat`                | Ask a question against a session    |
//! | POST   | `/api/generate_flashcards` | Generate flashcards for a session   |
//! | GET    | `/api/sessions/{id}`       | Session metadata                    |
//! | DELETE | `/api/sessions/{id}`       | Session teardown                    |

mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::analysis::AnalysisService;
use crate::chat::ChatService;
use crate::flashcards::FlashcardService;
use crate::ingestion::DocumentIngestor;
use crate::sessions::SessionStore;

pub use error::{ApiError, ErrorBody};

/// Upload size ceiling for document ingestion.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared handler state: the wired services.
#[derive(Clone)]
pub struct AppState {
    /// Document ingestion pipeline.
    pub ingestor: Arc<DocumentIngestor>,
    /// Question answering.
    pub chat: Arc<ChatService>,
    /// Flashcard generation.
    pub flashcards: Arc<FlashcardService>,
    /// Document analysis.
    pub analysis: Arc<AnalysisService>,
    /// Session lookup and teardown.
    pub store: Arc<SessionStore>,
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analyze_pdf", post(handlers::analyze_pdf))
        .route("/api/chat", post(handlers::chat))
        .route("/api/generate_flashcards", post(handlers::generate_flashcards))
        .route(
            "/api/sessions/{session_id}",
            get(handlers::session_info).delete(handlers::delete_session),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
