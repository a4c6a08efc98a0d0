use crate::search::tfidf::TfIdfModel;
use crate::search::{overlap, top_k_by_score};

/// Score given to every passage when the TF-IDF model could not be fitted.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Dependency-light relevance scoring over the passage texts.
#[derive(Debug, Clone)]
pub enum LexicalScorer {
    TermOverlap,
    /// `model` is `None` when the corpus had no usable vocabulary.
    TfIdf { model: Option<TfIdfModel> },
}

impl LexicalScorer {
    pub fn tfidf(passages: &[String], max_features: usize) -> Self {
        let model = TfIdfModel::fit(passages, max_features);
        if model.is_none() {
            tracing::warn!("TF-IDF model could not be fitted; queries will return default scores");
        }
        LexicalScorer::TfIdf { model }
    }

    /// Top `k` passage positions with their scores, highest first.
    pub fn rank(&self, query: &str, passages: &[String], k: usize) -> Vec<(usize, f32)> {
        match self {
            LexicalScorer::TermOverlap => {
                top_k_by_score(&overlap::score_passages(query, passages), k)
            }
            LexicalScorer::TfIdf { model: Some(model) } => {
                if model.len() != passages.len() {
                    tracing::error!(
                        "TF-IDF model covers {} passages but corpus has {}",
                        model.len(),
                        passages.len()
                    );
                    return Vec::new();
                }
                top_k_by_score(&model.similarities(query), k)
            }
            LexicalScorer::TfIdf { model: None } => (0..passages.len().min(k))
                .map(|i| (i, NEUTRAL_SCORE))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_term_overlap_ranks_best_match_first() {
        let corpus = passages(&["bread and butter", "neural networks learn", "networks of roads"]);
        let ranked = LexicalScorer::TermOverlap.rank("neural networks", &corpus, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0], (1, 1.0));
        assert_eq!(ranked[1], (2, 0.5));
    }

    #[test]
    fn test_term_overlap_ties_keep_corpus_order() {
        let corpus = passages(&["alpha one", "alpha two", "alpha three"]);
        let ranked = LexicalScorer::TermOverlap.rank("alpha", &corpus, 3);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_tfidf_ranking() {
        let corpus = passages(&[
            "Bread is baked from flour and yeast.",
            "Neural networks power deep learning.",
        ]);
        let scorer = LexicalScorer::tfidf(&corpus, 1000);
        let ranked = scorer.rank("deep learning", &corpus, 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 1);
        assert!(ranked[0].1 > 0.0);
    }

    #[test]
    fn test_unfitted_tfidf_returns_first_k_with_neutral_score() {
        let corpus = passages(&["the of and", "it is"]);
        let scorer = LexicalScorer::tfidf(&corpus, 1000);
        let ranked = scorer.rank("anything", &corpus, 5);
        assert_eq!(ranked, vec![(0, NEUTRAL_SCORE), (1, NEUTRAL_SCORE)]);
    }

    #[test]
    fn test_tfidf_corpus_mismatch_returns_nothing() {
        let fitted = passages(&["neural networks"]);
        let scorer = LexicalScorer::tfidf(&fitted, 1000);
        let other = passages(&["neural networks", "more text"]);
        assert!(scorer.rank("neural", &other, 2).is_empty());
    }
}
