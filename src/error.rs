use thiserror::Error;

use crate::search::vector::IndexError;

/// Rejections surfaced to callers of the ingestion and query pipeline.
///
/// Embedding-service and scoring failures never show up here: they degrade
/// to fallback embeddings, default scores or empty result lists instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("no documents uploaded; please upload documents first")]
    NoDocuments,
    #[error("question is required")]
    EmptyQuery,
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("no text passages could be created from the uploaded documents")]
    NoPassages,
    #[error("failed to build vector index: {0}")]
    Index(#[from] IndexError),
}

impl PipelineError {
    /// Whether the caller sent something unusable, as opposed to the
    /// pipeline failing on valid input.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, PipelineError::Index(_))
    }
}
