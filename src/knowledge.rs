//! The current document set: one retriever, replaced wholesale per upload batch.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::chunking::chunk_documents;
use crate::config::RetrievalConfig;
use crate::error::PipelineError;
use crate::ingest::{check_supported, Document};
use crate::llm::embeddings::Embedder;
use crate::models::{IngestReport, ScoredPassage, StatsResponse};
use crate::search::retriever::Retriever;

struct Loaded {
    /// Order in which the batch was started; a higher one always wins the swap.
    generation: u64,
    retriever: Retriever,
    report: IngestReport,
}

pub struct KnowledgeBase {
    config: RetrievalConfig,
    embedder: Embedder,
    current: RwLock<Option<Arc<Loaded>>>,
    next_generation: AtomicU64,
}

impl KnowledgeBase {
    pub fn new(config: RetrievalConfig, embedder: Embedder) -> Self {
        Self {
            config,
            embedder,
            current: RwLock::new(None),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Chunk and index a batch, then make it the active corpus.
    ///
    /// The new retriever is fully built before the swap, so concurrent
    /// queries see either the old corpus or the new one. A rejected batch
    /// leaves the previous corpus in place. Batches are ordered by when they
    /// start: one that finishes after a later batch is already active is
    /// reported but not installed.
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<IngestReport, PipelineError> {
        let generation = self.start_batch();
        self.ingest_batch(generation, documents).await
    }

    fn start_batch(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn ingest_batch(
        &self,
        generation: u64,
        documents: Vec<Document>,
    ) -> Result<IngestReport, PipelineError> {
        if documents.is_empty() {
            return Err(PipelineError::NoDocuments);
        }

        let corpus = chunk_documents(&documents, &self.config.chunker());
        if corpus.is_empty() {
            tracing::warn!("Batch of {} documents produced no passages", documents.len());
            return Err(PipelineError::NoPassages);
        }
        tracing::info!(
            "Chunked {} documents into {} passages",
            documents.len(),
            corpus.len()
        );

        let retriever = Retriever::build(
            corpus,
            self.config.mode,
            self.config.tfidf_max_features,
            &self.embedder,
        )
        .await?;

        let report = IngestReport {
            batch_id: Uuid::new_v4(),
            documents: documents.len(),
            passages: retriever.corpus().len(),
            fallback_embeddings: retriever.fallback_embeddings(),
            mode: retriever.mode(),
            ingested_at: Utc::now(),
        };

        let loaded = Loaded {
            generation,
            retriever,
            report: report.clone(),
        };
        if self.install(loaded) {
            tracing::info!("Batch {} is now active", report.batch_id);
        } else {
            tracing::warn!(
                "Batch {} finished after a newer batch was installed; discarding it",
                report.batch_id
            );
        }

        Ok(report)
    }

    /// Swap in `loaded` unless a batch started later is already active.
    fn install(&self, loaded: Loaded) -> bool {
        let mut current = self.current.write();
        if let Some(active) = current.as_ref() {
            if active.generation > loaded.generation {
                return false;
            }
        }
        *current = Some(Arc::new(loaded));
        true
    }

    /// Extract raw uploads and ingest them as one batch.
    ///
    /// Every file name is checked before any extraction starts. The batch's
    /// place in the upload order is fixed on entry, before PDF extraction.
    pub async fn ingest_uploads(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<IngestReport, PipelineError> {
        let generation = self.start_batch();
        if files.is_empty() {
            return Err(PipelineError::NoDocuments);
        }
        for (name, _) in &files {
            check_supported(name)?;
        }

        let mut documents = Vec::with_capacity(files.len());
        for (name, bytes) in files {
            documents.push(Document::from_upload(&name, bytes).await?);
        }
        self.ingest_batch(generation, documents).await
    }

    /// Retrieve passages for a question against the active corpus.
    pub async fn query(
        &self,
        question: &str,
        k: Option<usize>,
    ) -> Result<Vec<ScoredPassage>, PipelineError> {
        // Clone the Arc so the lock is not held across the await
        let loaded = self.current.read().clone();
        let loaded = loaded.ok_or(PipelineError::NoDocuments)?;

        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        let k = k.unwrap_or(self.config.top_k);
        Ok(loaded.retriever.retrieve(question, k).await)
    }

    pub fn passage_count(&self) -> usize {
        self.current
            .read()
            .as_ref()
            .map_or(0, |l| l.retriever.corpus().len())
    }

    pub fn stats(&self) -> StatsResponse {
        let current = self.current.read();
        match current.as_ref() {
            Some(loaded) => StatsResponse {
                documents_processed: loaded.retriever.corpus().len(),
                status: "ready".to_string(),
                mode: loaded.retriever.mode(),
                last_batch: Some(loaded.report.clone()),
            },
            None => StatsResponse {
                documents_processed: 0,
                status: "waiting_for_documents".to_string(),
                mode: self.config.mode,
                last_batch: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::models::Corpus;
    use crate::search::retriever::RetrievalMode;

    fn knowledge_base(mode: RetrievalMode) -> KnowledgeBase {
        let embedder = Embedder::new(
            reqwest::Client::new(),
            EmbeddingConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 2,
                ..EmbeddingConfig::default()
            },
        );
        KnowledgeBase::new(
            RetrievalConfig {
                mode,
                ..RetrievalConfig::default()
            },
            embedder,
        )
    }

    fn doc(name: &str, text: &str) -> Document {
        Document {
            filename: name.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_query_before_ingest_is_rejected() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        assert_eq!(kb.query("anything", None).await, Err(PipelineError::NoDocuments));
        // No documents takes precedence over an empty question
        assert_eq!(kb.query("  ", None).await, Err(PipelineError::NoDocuments));
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        kb.ingest(vec![doc("a.txt", "some text")]).await.unwrap();
        assert_eq!(kb.query("   ", None).await, Err(PipelineError::EmptyQuery));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        assert!(matches!(
            kb.ingest(Vec::new()).await,
            Err(PipelineError::NoDocuments)
        ));
        assert!(matches!(
            kb.ingest(vec![doc("a.txt", "   ")]).await,
            Err(PipelineError::NoPassages)
        ));
    }

    #[tokio::test]
    async fn test_ingest_reports_batch() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        let report = kb
            .ingest(vec![doc("a.txt", "alpha beta"), doc("b.txt", "gamma")])
            .await
            .unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.passages, 2);
        assert_eq!(report.fallback_embeddings, 0);
        assert_eq!(report.mode, RetrievalMode::TermOverlap);
        assert_eq!(kb.passage_count(), 2);
    }

    #[tokio::test]
    async fn test_new_batch_replaces_corpus() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        kb.ingest(vec![doc("old.txt", "old corpus text")]).await.unwrap();
        kb.ingest(vec![doc("new.txt", "fresh material")]).await.unwrap();

        let results = kb.query("old corpus text", Some(5)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "fresh material");
    }

    #[tokio::test]
    async fn test_rejected_batch_keeps_previous_corpus() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        kb.ingest(vec![doc("a.txt", "kept passage")]).await.unwrap();
        let err = kb
            .ingest_uploads(vec![("notes.docx".to_string(), b"x".to_vec())])
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::UnsupportedFileType("notes.docx".to_string()));
        assert_eq!(kb.passage_count(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_file_rejects_whole_batch() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        let err = kb
            .ingest_uploads(vec![
                ("good.txt".to_string(), b"fine".to_vec()),
                ("bad.exe".to_string(), b"nope".to_vec()),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFileType(_)));
        assert_eq!(kb.passage_count(), 0);
    }

    #[tokio::test]
    async fn test_default_k_is_configured_top_k() {
        let embedder = knowledge_base(RetrievalMode::TermOverlap).embedder;
        let kb = KnowledgeBase::new(
            RetrievalConfig {
                chunk_size: 12,
                ..RetrievalConfig::default()
            },
            embedder,
        );
        let text = (0..20).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        kb.ingest(vec![doc("a.txt", &text)]).await.unwrap();
        assert!(kb.passage_count() > 3);
        assert_eq!(kb.query("word1", None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_stats_reflect_active_batch() {
        let kb = knowledge_base(RetrievalMode::Tfidf);
        let stats = kb.stats();
        assert_eq!(stats.documents_processed, 0);
        assert!(stats.last_batch.is_none());

        kb.ingest(vec![doc("a.txt", "neural networks")]).await.unwrap();
        let stats = kb.stats();
        assert_eq!(stats.documents_processed, 1);
        assert_eq!(stats.mode, RetrievalMode::Tfidf);
        assert_eq!(stats.status, "ready");
        assert!(stats.last_batch.is_some());
    }

    #[tokio::test]
    async fn test_vector_mode_counts_fallbacks() {
        let kb = knowledge_base(RetrievalMode::Vector);
        let report = kb
            .ingest(vec![doc("a.txt", "first"), doc("b.txt", "second")])
            .await
            .unwrap();
        assert_eq!(report.fallback_embeddings, 2);
        let results = kb.query("first", Some(1)).await.unwrap();
        assert_eq!(results[0].content, "first");
    }

    fn loaded(generation: u64, passage: &str) -> Loaded {
        let retriever = Retriever::term_overlap(Corpus::new(vec![passage.to_string()]));
        Loaded {
            generation,
            report: IngestReport {
                batch_id: Uuid::new_v4(),
                documents: 1,
                passages: 1,
                fallback_embeddings: 0,
                mode: retriever.mode(),
                ingested_at: Utc::now(),
            },
            retriever,
        }
    }

    #[tokio::test]
    async fn test_older_batch_cannot_replace_newer_one() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        let older = kb.start_batch();
        let newer = kb.start_batch();
        assert!(newer > older);

        assert!(kb.install(loaded(newer, "newer upload")));
        assert!(!kb.install(loaded(older, "older upload")));

        let results = kb.query("upload", Some(5)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "newer upload");
    }

    #[tokio::test]
    async fn test_rejected_upload_still_takes_a_generation() {
        let kb = knowledge_base(RetrievalMode::TermOverlap);
        let before = kb.start_batch();
        assert!(kb.ingest_uploads(Vec::new()).await.is_err());
        kb.ingest(vec![doc("a.txt", "later batch")]).await.unwrap();
        assert!(kb.start_batch() > before + 2);
        assert!(!kb.install(loaded(before, "stale")));
        assert_eq!(kb.query("batch", Some(1)).await.unwrap()[0].content, "later batch");
    }
}
