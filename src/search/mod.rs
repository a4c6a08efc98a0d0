//! Passage ranking: vector nearest-neighbour search and lexical scorers
//! behind a single [`retriever::Retriever`] facade.

pub mod lexical;
pub mod overlap;
pub mod retriever;
pub mod tfidf;
pub mod vector;

/// Positions of the `k` highest scores, highest first.
///
/// The sort is stable, so equal scores keep corpus order.
pub fn top_k_by_score(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}
