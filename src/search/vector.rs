use thiserror::Error;

use crate::models::Vector;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("vector index is empty")]
    Empty,
    #[error("vectors must have at least one dimension")]
    ZeroDimension,
    #[error("dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A search hit: corpus position plus raw L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

impl Neighbor {
    pub fn similarity(&self) -> f32 {
        distance_to_similarity(self.distance)
    }
}

/// Map an L2 distance onto (0, 1]: identical vectors score 1.
///
/// Display only. Ranking is done on the raw distance.
pub fn distance_to_similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Exact nearest-neighbour index over same-dimension vectors.
///
/// Vectors are stored row-major in one flat buffer. The index is immutable
/// once built; a new batch builds a new index.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build an index over a batch. An empty batch gives an empty index.
    pub fn build(vectors: &[Vector]) -> Result<Self, IndexError> {
        let Some(first) = vectors.first() else {
            return Ok(Self::default());
        };

        let dimension = first.len();
        if dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for vector in vectors {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dimension, data })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` nearest vectors by L2 distance, nearest first.
    ///
    /// `k` is clamped to the index size; equal distances keep insertion order.
    pub fn try_search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if self.is_empty() {
            return Err(IndexError::Empty);
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(index, row)| Neighbor {
                index,
                distance: l2_distance(query, row),
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    /// Like [`try_search`](Self::try_search), but an unusable index or query
    /// degrades to no results.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        match self.try_search(query, k) {
            Ok(neighbors) => neighbors,
            Err(e) => {
                tracing::warn!("Vector search returned no results: {e}");
                Vec::new()
            }
        }
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> VectorIndex {
        VectorIndex::build(&[
            vec![0.0, 0.0],
            vec![3.0, 4.0],
            vec![1.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_build_records_shape() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), 2);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let hits = sample_index().search(&[0.0, 0.0], 3);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![0, 2, 1]);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].distance, 1.0);
        assert_eq!(hits[2].distance, 5.0);
    }

    #[test]
    fn test_k_larger_than_corpus_is_clamped() {
        let hits = sample_index().search(&[2.0, 2.0], 50);
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_k_zero_returns_nothing() {
        assert!(sample_index().search(&[0.0, 0.0], 0).is_empty());
    }

    #[test]
    fn test_equal_distances_keep_insertion_order() {
        let index = VectorIndex::build(&[vec![1.0], vec![-1.0], vec![1.0]]).unwrap();
        let hits = index.search(&[0.0], 3);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_unbuilt_index_returns_empty() {
        let index = VectorIndex::default();
        assert!(index.search(&[1.0, 2.0], 3).is_empty());
        assert_eq!(index.try_search(&[1.0], 3), Err(IndexError::Empty));
    }

    #[test]
    fn test_empty_batch_builds_empty_index() {
        let index = VectorIndex::build(&[]).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[], 1).is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = sample_index();
        assert_eq!(
            index.try_search(&[1.0, 2.0, 3.0], 1),
            Err(IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert!(index.search(&[1.0, 2.0, 3.0], 1).is_empty());
    }

    #[test]
    fn test_build_rejects_mixed_dimensions() {
        let err = VectorIndex::build(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_build_rejects_zero_dimension() {
        assert_eq!(
            VectorIndex::build(&[vec![]]).unwrap_err(),
            IndexError::ZeroDimension
        );
    }

    #[test]
    fn test_similarity_conversion() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
        assert_eq!(distance_to_similarity(1.0), 0.5);
        assert!(distance_to_similarity(1000.0) > 0.0);
        let near = Neighbor {
            index: 0,
            distance: 0.5,
        };
        let far = Neighbor {
            index: 1,
            distance: 2.0,
        };
        assert!(near.similarity() > far.similarity());
    }
}
