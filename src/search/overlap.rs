//! Term-overlap relevance: the share of query words found in a passage.

use std::collections::HashSet;

/// Lowest score any passage can receive.
pub const MIN_SCORE: f32 = 0.1;
pub const MAX_SCORE: f32 = 1.0;

/// Lower-cased whitespace tokens with surrounding punctuation stripped.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// `|query ∩ passage| / |query|`, clamped to [`MIN_SCORE`], [`MAX_SCORE`].
///
/// An empty query scores every passage at the floor.
pub fn overlap_score(query_words: &HashSet<String>, passage: &str) -> f32 {
    if query_words.is_empty() {
        return MIN_SCORE;
    }

    let passage_words = word_set(passage);
    let common = query_words.intersection(&passage_words).count();
    let score = common as f32 / query_words.len() as f32;
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Score every passage against the query, in corpus order.
pub fn score_passages(query: &str, passages: &[String]) -> Vec<f32> {
    let query_words = word_set(query);
    passages
        .iter()
        .map(|p| overlap_score(&query_words, p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_set_normalizes() {
        let words = word_set("What is Machine-learning? (AI)");
        assert!(words.contains("what"));
        assert!(words.contains("machine-learning"));
        assert!(words.contains("ai"));
        assert_eq!(words.len(), 4);
    }

    #[test]
    fn test_identical_text_scores_one() {
        let passage = "Deep learning uses neural networks.";
        let scores = score_passages(passage, &[passage.to_string()]);
        assert_eq!(scores, vec![1.0]);
    }

    #[test]
    fn test_partial_overlap() {
        let scores = score_passages(
            "What is machine learning?",
            &["Machine learning is a subset of AI.".to_string()],
        );
        // machine, learning, is out of what/is/machine/learning
        assert!((scores[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_no_overlap_hits_floor() {
        let scores = score_passages("quantum chromodynamics", &["cooking recipes".to_string()]);
        assert_eq!(scores, vec![MIN_SCORE]);
    }

    #[test]
    fn test_empty_query_scores_floor() {
        let passages = vec!["a b".to_string(), "c d".to_string()];
        assert_eq!(score_passages("", &passages), vec![MIN_SCORE, MIN_SCORE]);
        assert_eq!(score_passages("?!", &passages), vec![MIN_SCORE, MIN_SCORE]);
    }

    #[test]
    fn test_scores_always_in_range() {
        let passages: Vec<String> = ["", "x", "alpha beta gamma", "ALPHA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for query in ["alpha", "alpha beta delta", "", "zzz"] {
            for score in score_passages(query, &passages) {
                assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
            }
        }
    }
}
