//! Text extraction for uploaded documents.
//!
//! Only `.txt` and `.pdf` uploads are accepted. A file that yields no text is
//! kept as a labelled placeholder so it is never silently dropped from a batch.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

use crate::error::PipelineError;

/// Upper bound on parsing a single PDF.
pub const PDF_TIMEOUT: Duration = Duration::from_secs(60);

/// Extracted document text plus the name it was uploaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Pdf,
}

impl FileKind {
    /// Detect the kind from the file extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())?;
        match ext.as_str() {
            "txt" => Some(FileKind::Text),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }
}

/// Reject a file name the pipeline cannot extract text from.
pub fn check_supported(filename: &str) -> Result<FileKind, PipelineError> {
    FileKind::from_filename(filename)
        .ok_or_else(|| PipelineError::UnsupportedFileType(filename.to_string()))
}

impl Document {
    /// Extract text from raw upload bytes.
    ///
    /// PDF parsing runs on the blocking pool and is abandoned after
    /// [`PDF_TIMEOUT`].
    pub async fn from_upload(filename: &str, bytes: Vec<u8>) -> Result<Self, PipelineError> {
        Self::extract(filename, bytes, PDF_TIMEOUT).await
    }

    /// Read and extract a document from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .with_context(|| format!("Not a file path: {}", path.display()))?;
        check_supported(&filename)?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_upload(&filename, bytes).await?)
    }

    async fn extract(
        filename: &str,
        bytes: Vec<u8>,
        pdf_timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let text = match check_supported(filename)? {
            FileKind::Text => {
                let content = String::from_utf8_lossy(&bytes);
                if content.trim().is_empty() {
                    format!("Empty text file: {filename}")
                } else {
                    content.into_owned()
                }
            }
            FileKind::Pdf => match extract_pdf(bytes, pdf_timeout).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => format!("PDF file contains no extractable text: {filename}"),
                Err(e) => {
                    tracing::warn!("PDF extraction failed for {filename}: {e:#}");
                    format!("Error reading PDF {filename}: {e}")
                }
            },
        };

        Ok(Self {
            filename: filename.to_string(),
            text,
        })
    }
}

async fn extract_pdf(bytes: Vec<u8>, limit: Duration) -> Result<String> {
    let pages = run_blocking(limit, move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| anyhow::anyhow!("{e}"))
    })
    .await?;
    Ok(label_pages(&pages))
}

/// Run `work` on the blocking pool, giving up after `limit`.
///
/// A panic inside `work` comes back as an error. On timeout the blocking
/// thread is left to finish on its own and its result is dropped.
async fn run_blocking<T, F>(limit: Duration, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => anyhow::bail!("PDF parser crashed: {e}"),
        Err(_) => anyhow::bail!("PDF parsing timed out after {}s", limit.as_secs()),
    }
}

/// Prefix every non-blank page with `Page N:`, numbering from 1.
fn label_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| format!("Page {}:\n{}\n\n", i + 1, page.trim()))
        .collect()
}
