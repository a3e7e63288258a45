//! Similarity search over the precomputed cross-season neighbor table.

mod cosine;
mod engine;

pub use cosine::cosine_similarity;
pub use engine::{similarity_percent, SimilarPlayer, SimilarityEngine};
