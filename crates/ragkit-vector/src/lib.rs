//! ragkit-vector
//!
//! Embedding-similarity ranking over caller-supplied chunks, plus a
//! content-addressed embedding cache.
pub mod cache;
pub mod ranker;
pub mod similarity;

pub use cache::{CachedEmbedder, EmbeddingCache};
pub use ranker::VectorRanker;
pub use similarity::similarity;
