//! Document chunking: whitespace-token passages under a character budget.

pub mod words;

use serde::{Deserialize, Serialize};

use crate::ingest::Document;
use crate::models::Corpus;

pub use words::chunk_words;

/// Passage sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target passage length in characters, separators included.
    pub size: usize,
    /// Characters of trailing context repeated at the start of the next passage.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            size: 500,
            overlap: 0,
        }
    }
}

/// Chunk every document of a batch into one corpus, in upload order.
pub fn chunk_documents(documents: &[Document], config: &ChunkerConfig) -> Corpus {
    let mut passages = Vec::new();

    for document in documents {
        let chunks = chunk_words(&document.text, config);
        if chunks.is_empty() {
            tracing::warn!("No text extracted from {}", document.filename);
            continue;
        }
        tracing::debug!("{}: {} passages", document.filename, chunks.len());
        passages.extend(chunks);
    }

    Corpus::new(passages)
}
