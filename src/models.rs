use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::retriever::RetrievalMode;

/// Fixed-length embedding of a passage or query.
pub type Vector = Vec<f32>;

/// Ordered passages produced from one ingestion batch.
///
/// A passage is identified only by its position; insertion order is kept so
/// ties and "first k" fallbacks resolve deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    passages: Vec<String>,
}

impl Corpus {
    pub fn new(passages: Vec<String>) -> Self {
        Self { passages }
    }

    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.passages.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// A retrieved passage with its similarity score in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub content: String,
    pub score: f32,
}

/// Summary of one ingestion batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub batch_id: Uuid,
    pub documents: usize,
    pub passages: usize,
    /// Passages embedded with the local hash fallback (vector mode only)
    pub fallback_embeddings: usize,
    pub mode: RetrievalMode,
    pub ingested_at: DateTime<Utc>,
}

/// Query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub k: Option<usize>,
}

/// A source passage shown alongside a generated answer
#[derive(Debug, Clone, Serialize)]
pub struct SourceSnippet {
    pub source_id: usize,
    pub content: String,
    /// Score formatted to three decimals
    pub similarity_score: String,
    pub content_length: usize,
}

/// Query response
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceSnippet>,
    pub retrieved_chunks: usize,
}

/// Raw retrieval request
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    pub k: Option<usize>,
}

/// Upload response
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub chunks_created: usize,
    pub files: Vec<String>,
    pub report: IngestReport,
}

/// Stats response
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub documents_processed: usize,
    pub status: String,
    pub mode: RetrievalMode,
    pub last_batch: Option<IngestReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_preserves_order() {
        let corpus = Corpus::new(vec!["first".into(), "second".into()]);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0), Some("first"));
        assert_eq!(corpus.get(1), Some("second"));
        assert_eq!(corpus.get(2), None);
    }

    #[test]
    fn test_scored_passage_serializes_content_and_score() {
        let passage = ScoredPassage {
            content: "hello".to_string(),
            score: 0.5,
        };
        let json = serde_json::to_value(&passage).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["score"], 0.5);
    }
}
