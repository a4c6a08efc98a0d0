pub mod answer;
pub mod embeddings;
