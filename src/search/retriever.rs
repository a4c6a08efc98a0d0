//! Retrieval facade: one entry point, strategy fixed at construction.

use serde::{Deserialize, Serialize};

use crate::llm::embeddings::Embedder;
use crate::models::{Corpus, ScoredPassage};
use crate::search::lexical::LexicalScorer;
use crate::search::vector::{IndexError, VectorIndex};

/// How passages are scored against a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    TermOverlap,
    Tfidf,
    Vector,
}

impl RetrievalMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode.trim().to_lowercase().as_str() {
            "term_overlap" | "overlap" | "keyword" => Some(RetrievalMode::TermOverlap),
            "tfidf" | "tf-idf" => Some(RetrievalMode::Tfidf),
            "vector" | "embedding" => Some(RetrievalMode::Vector),
            _ => None,
        }
    }
}

/// Nearest-neighbour search over passage embeddings.
pub struct VectorStrategy {
    embedder: Embedder,
    index: VectorIndex,
}

impl VectorStrategy {
    async fn rank(&self, query: &str, k: usize) -> Vec<(usize, f32)> {
        // Same transformation as the passages, so distances are comparable
        let embedding = self.embedder.embed(query).await;
        self.index
            .search(&embedding.vector, k)
            .into_iter()
            .map(|n| (n.index, n.similarity()))
            .collect()
    }
}

pub struct LexicalStrategy {
    scorer: LexicalScorer,
}

pub enum Strategy {
    Vector(VectorStrategy),
    Lexical(LexicalStrategy),
}

/// A corpus together with the scoring state derived from it.
///
/// Both are built together and never updated in place, so the index can
/// never describe a different corpus than the one it is queried with.
pub struct Retriever {
    corpus: Corpus,
    strategy: Strategy,
    fallback_embeddings: usize,
}

impl Retriever {
    pub fn term_overlap(corpus: Corpus) -> Self {
        Self::lexical(corpus, LexicalScorer::TermOverlap)
    }

    pub fn tfidf(corpus: Corpus, max_features: usize) -> Self {
        let scorer = LexicalScorer::tfidf(corpus.passages(), max_features);
        Self::lexical(corpus, scorer)
    }

    pub fn lexical(corpus: Corpus, scorer: LexicalScorer) -> Self {
        Self {
            corpus,
            strategy: Strategy::Lexical(LexicalStrategy { scorer }),
            fallback_embeddings: 0,
        }
    }

    /// Embed every passage and build the vector index over them.
    pub async fn vector(corpus: Corpus, embedder: Embedder) -> Result<Self, IndexError> {
        let batch = embedder.embed_passages(corpus.passages()).await;
        if batch.fallbacks > 0 {
            tracing::warn!(
                "{}/{} passages embedded with the local fallback",
                batch.fallbacks,
                corpus.len()
            );
        }

        let index = VectorIndex::build(&batch.vectors)?;
        tracing::info!(
            "Vector index built: {} vectors of dimension {}",
            index.len(),
            index.dimension()
        );

        Ok(Self {
            corpus,
            strategy: Strategy::Vector(VectorStrategy { embedder, index }),
            fallback_embeddings: batch.fallbacks,
        })
    }

    /// Build the retriever for the configured mode.
    pub async fn build(
        corpus: Corpus,
        mode: RetrievalMode,
        tfidf_max_features: usize,
        embedder: &Embedder,
    ) -> Result<Self, IndexError> {
        match mode {
            RetrievalMode::TermOverlap => Ok(Self::term_overlap(corpus)),
            RetrievalMode::Tfidf => Ok(Self::tfidf(corpus, tfidf_max_features)),
            RetrievalMode::Vector => Self::vector(corpus, embedder.clone()).await,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn mode(&self) -> RetrievalMode {
        match &self.strategy {
            Strategy::Vector(_) => RetrievalMode::Vector,
            Strategy::Lexical(LexicalStrategy {
                scorer: LexicalScorer::TermOverlap,
            }) => RetrievalMode::TermOverlap,
            Strategy::Lexical(_) => RetrievalMode::Tfidf,
        }
    }

    pub fn fallback_embeddings(&self) -> usize {
        self.fallback_embeddings
    }

    /// Up to `k` passages ordered by descending score.
    ///
    /// Never fails: an empty corpus, an unusable index or a query that
    /// matches nothing all come back as a shorter (possibly empty) list.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<ScoredPassage> {
        if self.corpus.is_empty() || k == 0 {
            return Vec::new();
        }

        let ranked = match &self.strategy {
            Strategy::Vector(s) => s.rank(query, k).await,
            Strategy::Lexical(s) => s.scorer.rank(query, self.corpus.passages(), k),
        };

        let results: Vec<ScoredPassage> = ranked
            .into_iter()
            .filter_map(|(index, score)| match self.corpus.get(index) {
                Some(content) => Some(ScoredPassage {
                    content: content.to_string(),
                    score,
                }),
                None => {
                    tracing::error!("Ranked position {index} is outside the corpus");
                    None
                }
            })
            .collect();

        tracing::info!("Retrieved {} passages for query: {query}", results.len());
        results
    }
}
