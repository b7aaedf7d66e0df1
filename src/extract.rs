//! Text extraction from uploaded documents.
//!
//! The rest of the crate only ever sees extracted text; this module is the
//! boundary where binary document formats are decoded.

use thiserror::Error;

/// Errors raised while extracting text from a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The document could not be decoded at all.
    #[error("unable to read document: {0}")]
    Unreadable(String),

    /// Decoding succeeded but yielded no text.
    #[error("no text could be extracted from the document")]
    EmptyDocument,
}

/// Extracts text from PDF bytes.
///
/// Fails with [`ExtractionError::EmptyDocument`] when the document decodes
/// but contains no recoverable text (e.g. scanned images without an OCR
/// layer). Extraction is CPU-bound; callers on an async runtime should run
/// it on a blocking thread.
pub fn pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|err| ExtractionError::Unreadable(err.to_string()))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(trimmed.to_string())
}
