//! ragkit-hybrid
//!
//! Combines lexical and vector rankings (weighted min-max or reciprocal rank
//! fusion), reranks with a pairwise scorer, and wires both into a single
//! [`HybridRetriever`].
pub mod fusion;
pub mod rerank;
pub mod retriever;
pub mod scorer;

pub use fusion::fuse;
pub use rerank::{Rankable, Reranker};
pub use retriever::HybridRetriever;
pub use scorer::TermOverlapScorer;
