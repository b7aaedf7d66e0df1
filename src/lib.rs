//! # Lectern: document question-answering backend
//!
//! Lectern accepts an uploaded document, extracts its text, produces a
//! summary/keywords/study-questions analysis, and answers follow-up
//! questions against the document's content. Each upload opens a *session*:
//! the document's chunked text plus a dedicated, persisted retrieval index,
//! addressed by an opaque identifier.
//!
//! ```text
//! upload ──► extract::pdf_text ──► analysis (summary / keywords / questions)
//!                     │
//!                     └─► ingestion ──► chunking ──► providers::embedding
//!                              │                            │
//!                              └─► stores::SqliteChunkIndex ┘  (persisted per session)
//!                              │
//!                              └─► sessions::SessionStore (session_id)
//!
//! session_id ─┬─► chat::answer        ──► retrieval + providers::completion
//!             └─► flashcards::generate ──► providers::completion
//! ```
//!
//! The embedding and completion providers, the text extractor, and the vector
//! index are all behind seams in [`providers`], [`extract`], and [`stores`];
//! the HTTP surface in [`api`] is a thin validation-and-envelope layer over
//! the services.

pub mod analysis;
pub mod api;
pub mod chat;
pub mod chunking;
pub mod config;
pub mod extract;
pub mod flashcards;
pub mod ingestion;
pub mod message;
pub mod providers;
pub mod sessions;
pub mod stores;

mod util;
