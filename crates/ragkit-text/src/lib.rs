//! ragkit-text
//!
//! Lexical ranking: an in-memory BM25 model rebuilt per query (or built once
//! through [`Bm25Index`]) and an in-RAM tantivy index behind the same
//! [`LexicalIndex`] interface.
pub mod bm25;
pub mod tantivy_index;
pub mod tokenize;

use ragkit_core::{Result, ScoredCandidate};

pub use bm25::{Bm25Index, Bm25Ranker};
pub use tantivy_index::TantivyIndex;
pub use tokenize::{AnalyzerTokenizer, MixedScriptTokenizer};

/// A lexical index built once over a fixed chunk set and queried many times.
pub trait LexicalIndex: Send + Sync {
	fn search(&self, query: &str, top_k: usize, min_score: Option<f32>) -> Result<Vec<ScoredCandidate>>;

	/// Number of indexed chunks.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
