//! Recursive character chunking for document ingestion.
//!
//! Documents are split along a priority-ordered list of separators, with
//! oversized pieces re-split using progressively finer separators and merged
//! back together up to the configured chunk size. A configurable overlap is
//! carried from the tail of each chunk into the head of the next so retrieval
//! keeps context across chunk boundaries.
//!
//! Splitting is a pure function of the input text and configuration: the same
//! input always yields the same chunk sequence.

/// Configuration for [`TextChunker`].
///
/// Defaults match the ingestion pipeline's tuning: 1000-character chunks with
/// a 200-character overlap, splitting on paragraph breaks before line breaks,
/// sentence boundaries, and words. The final empty separator hard-slices text
/// that contains none of the preceding separators.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum chunk length, in characters.
    pub chunk_size: usize,
    /// Characters duplicated from the end of one chunk into the start of the
    /// next.
    pub chunk_overlap: usize,
    /// Separators tried in priority order. An empty string means "slice at
    /// character boundaries".
    pub separators: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: ["\n\n", "\n", ". ", " ", ""]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Splits raw document text into overlapping chunks suitable for embedding.
///
/// # Examples
///
/// ```
/// use lectern::chunking::{ChunkerConfig, TextChunker};
///
/// let chunker = TextChunker::new(ChunkerConfig::default());
/// let chunks = chunker.split("The mitochondria is the powerhouse of the cell.");
/// assert_eq!(chunks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    /// Creates a chunker with the given configuration.
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Splits `text` into chunks of at most `chunk_size` characters.
    ///
    /// A chunk may exceed `chunk_size` only when a single indivisible piece
    /// does and no finer separator (including the hard-slicing empty
    /// separator) is configured. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let pieces = self.split_pieces(text, 0);
        self.merge_pieces(pieces)
    }

    /// Recursively splits `text` with the separator at `sep_idx`, falling
    /// through to finer separators for pieces that still exceed the chunk
    /// size.
    fn split_pieces(&self, text: &str, sep_idx: usize) -> Vec<String> {
        if char_len(text) <= self.config.chunk_size {
            return vec![text.to_string()];
        }
        let Some(separator) = self.config.separators.get(sep_idx) else {
            // Separators exhausted: the piece is indivisible and kept whole.
            return vec![text.to_string()];
        };
        if separator.is_empty() {
            return slice_chars(text, self.config.chunk_size);
        }
        if !text.contains(separator.as_str()) {
            return self.split_pieces(text, sep_idx + 1);
        }

        let mut pieces = Vec::new();
        for part in text.split_inclusive(separator.as_str()) {
            if char_len(part) <= self.config.chunk_size {
                pieces.push(part.to_string());
            } else {
                pieces.extend(self.split_pieces(part, sep_idx + 1));
            }
        }
        pieces
    }

    /// Merges adjacent pieces back together up to `chunk_size`, carrying
    /// `chunk_overlap` trailing characters of each emitted chunk into the
    /// next one.
    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if current_len > 0 && current_len + piece_len > self.config.chunk_size {
                let tail = tail_chars(&current, self.config.chunk_overlap);
                let tail_len = char_len(&tail);
                chunks.push(std::mem::take(&mut current));
                // Seed the next chunk with the overlap unless doing so would
                // immediately push it over the size limit.
                if tail_len + piece_len <= self.config.chunk_size {
                    current = tail;
                    current_len = tail_len;
                } else {
                    current_len = 0;
                }
            }
            current.push_str(&piece);
            current_len += piece_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Slices `text` into consecutive pieces of at most `max_chars` characters.
fn slice_chars(text: &str, max_chars: usize) -> Vec<String> {
    debug_assert!(max_chars > 0);
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        piece.push(ch);
        count += 1;
        if count == max_chars {
            pieces.push(std::mem::take(&mut piece));
            count = 0;
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Returns the last `max_chars` characters of `text`.
fn tail_chars(text: &str, max_chars: usize) -> String {
    let total = char_len(text);
    if total <= max_chars {
        return text.to_string();
    }
    text.chars().skip(total - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word_chunker(chunk_size: usize, chunk_overlap: usize) -> TextChunker {
        TextChunker::new(ChunkerConfig {
            chunk_size,
            chunk_overlap,
            ..ChunkerConfig::default()
        })
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = TextChunker::new(ChunkerConfig::default());
        let text = "The mitochondria is the powerhouse of the cell. It produces ATP.";
        let chunks = chunker.split(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = TextChunker::new(ChunkerConfig::default());
        assert!(chunker.split("").is_empty());
    }

    #[test]
    fn splitting_is_deterministic() {
        let chunker = word_chunker(40, 10);
        let text = "Paragraph one talks about one thing.\n\nParagraph two talks about \
                    another thing entirely. It keeps going for a while to force a split.";
        let first = chunker.split(text);
        let second = chunker.split(text);
        assert_eq!(first, second);
    }

    #[test]
    fn chunks_respect_the_size_limit() {
        let chunker = word_chunker(40, 10);
        let text = "one two three four five six seven eight nine ten eleven twelve \
                    thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty";
        for chunk in chunker.split(text) {
            assert!(
                chunk.chars().count() <= 40,
                "chunk exceeds limit: {chunk:?}"
            );
        }
    }

    #[test]
    fn overlap_is_carried_between_chunks() {
        let chunker = word_chunker(12, 4);
        let text = "aaaa bbbb cccc dddd eeee ffff";
        let chunks = chunker.split(text);
        assert!(chunks.len() > 1, "text should split into multiple chunks");
        for pair in chunks.windows(2) {
            let tail = tail_chars(&pair[0], 4);
            assert!(
                pair[1].starts_with(&tail),
                "chunk {:?} does not start with overlap {:?}",
                pair[1],
                tail
            );
        }
    }

    #[test]
    fn oversized_word_is_hard_sliced_by_default() {
        let chunker = word_chunker(10, 0);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.split(text);
        assert_eq!(chunks, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn oversized_word_survives_without_hard_slicing() {
        // Without the empty separator there is nothing finer than a word, so
        // an indivisible token is allowed to exceed the limit.
        let chunker = TextChunker::new(ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 0,
            separators: vec![" ".to_string()],
        });
        let chunks = chunker.split("tiny incomprehensibilities end");
        assert!(chunks.iter().any(|c| c.chars().count() > 10));
        assert!(chunks.concat().contains("incomprehensibilities"));
    }

    #[test]
    fn paragraph_breaks_take_priority() {
        let chunker = word_chunker(40, 0);
        let text = "First paragraph fits in one chunk.\n\nSecond paragraph also fits.";
        let chunks = chunker.split(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("First paragraph"));
        assert!(chunks[1].starts_with("Second paragraph"));
    }

    #[test]
    fn multibyte_text_splits_on_character_boundaries() {
        let chunker = word_chunker(8, 2);
        let text = "ééééé ööööö üüüüü ååååå";
        for chunk in chunker.split(text) {
            assert!(chunk.chars().count() <= 8);
        }
    }

    proptest! {
        #[test]
        fn split_is_pure(text in "[a-z \\n.]{0,400}") {
            let chunker = word_chunker(50, 10);
            prop_assert_eq!(chunker.split(&text), chunker.split(&text));
        }

        #[test]
        fn split_never_exceeds_chunk_size(text in "[a-z \\n.]{0,400}") {
            let chunker = word_chunker(50, 10);
            for chunk in chunker.split(&text) {
                prop_assert!(chunk.chars().count() <= 50);
            }
        }

        #[test]
        fn nonempty_text_yields_chunks(text in "[a-z]{1,100}( [a-z]{1,100}){0,20}") {
            let chunker = word_chunker(50, 10);
            prop_assert!(!chunker.split(&text).is_empty());
        }
    }
}
