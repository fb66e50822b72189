//! Okapi BM25 over an explicit chunk set.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use ragkit_core::config::Bm25Config;
use ragkit_core::traits::{Retriever, Tokenizer};
use ragkit_core::types::{filter_and_truncate, sort_by_score_desc};
use ragkit_core::{Chunk, Result, ScoredCandidate};

use crate::tokenize::MixedScriptTokenizer;
use crate::LexicalIndex;

/// Corpus statistics for one chunk set. Immutable once built.
pub struct Bm25Index {
	chunks: Vec<Chunk>,
	term_freqs: Vec<HashMap<String, u32>>,
	doc_lens: Vec<usize>,
	avgdl: f32,
	idf: HashMap<String, f32>,
	config: Bm25Config,
	tokenizer: Arc<dyn Tokenizer>,
}

impl Bm25Index {
	pub fn build(chunks: &[Chunk], config: &Bm25Config, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
		config.validate()?;
		let mut term_freqs = Vec::with_capacity(chunks.len());
		let mut doc_lens = Vec::with_capacity(chunks.len());
		let mut doc_freq: HashMap<String, usize> = HashMap::new();

		for chunk in chunks {
			let tokens = tokenizer.tokenize(&chunk.content);
			doc_lens.push(tokens.len());
			let mut tf: HashMap<String, u32> = HashMap::new();
			for token in tokens {
				*tf.entry(token).or_default() += 1;
			}
			for term in tf.keys() {
				*doc_freq.entry(term.clone()).or_default() += 1;
			}
			term_freqs.push(tf);
		}

		#[allow(clippy::cast_precision_loss)]
		let n = chunks.len() as f32;
		#[allow(clippy::cast_precision_loss)]
		let avgdl = if chunks.is_empty() { 0.0 } else { doc_lens.iter().sum::<usize>() as f32 / n };

		#[allow(clippy::cast_precision_loss)]
		let mut idf: HashMap<String, f32> = doc_freq
			.into_iter()
			.map(|(term, df)| {
				let df = df as f32;
				(term, (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
			})
			.collect();
		if !idf.is_empty() {
			#[allow(clippy::cast_precision_loss)]
			let mean = idf.values().sum::<f32>() / idf.len() as f32;
			let floor = config.epsilon * mean;
			for value in idf.values_mut() {
				if *value < floor { *value = floor; }
			}
		}

		debug!(chunks = chunks.len(), terms = idf.len(), avgdl, "bm25 statistics built");
		Ok(Self { chunks: chunks.to_vec(), term_freqs, doc_lens, avgdl, idf, config: config.clone(), tokenizer })
	}

	pub fn chunks(&self) -> &[Chunk] {
		&self.chunks
	}

	/// Term counts of the chunk at `position`, in the index's tokenization.
	pub fn term_frequencies(&self, position: usize) -> Option<&HashMap<String, u32>> {
		self.term_freqs.get(position)
	}

	pub fn idf(&self, term: &str) -> Option<f32> {
		self.idf.get(term).copied()
	}

	/// Raw BM25 score of every chunk, in index order.
	pub fn scores(&self, query: &str) -> Vec<f32> {
		let terms = self.tokenizer.tokenize(query);
		let Bm25Config { k1, b, .. } = self.config;
		let avgdl = if self.avgdl > 0.0 { self.avgdl } else { 1.0 };

		self.term_freqs
			.iter()
			.zip(&self.doc_lens)
			.map(|(tf, &dl)| {
				#[allow(clippy::cast_precision_loss)]
				let norm = k1 * (1.0 - b + b * dl as f32 / avgdl);
				terms
					.iter()
					.filter_map(|t| Some((self.idf.get(t)?, *tf.get(t)? as f32)))
					.map(|(idf, f)| idf * f * (k1 + 1.0) / (f + norm))
					.sum()
			})
			.collect()
	}

	pub fn search(&self, query: &str, top_k: usize, min_score: Option<f32>) -> Vec<ScoredCandidate> {
		if top_k == 0 || self.chunks.is_empty() {
			return Vec::new();
		}
		let mut ranked: Vec<ScoredCandidate> = self
			.scores(query)
			.into_iter()
			.zip(&self.chunks)
			.map(|(score, chunk)| ScoredCandidate::new(chunk.clone(), score))
			.collect();
		sort_by_score_desc(&mut ranked, |c| c.score);
		filter_and_truncate(ranked, top_k, min_score, |c| c.score)
	}
}

impl LexicalIndex for Bm25Index {
	fn search(&self, query: &str, top_k: usize, min_score: Option<f32>) -> Result<Vec<ScoredCandidate>> {
		Ok(Bm25Index::search(self, query, top_k, min_score))
	}

	fn len(&self) -> usize {
		self.chunks.len()
	}
}

/// Stateless BM25 retriever: statistics are rebuilt over exactly the chunks
/// passed to each call.
#[derive(Clone)]
pub struct Bm25Ranker {
	config: Bm25Config,
	tokenizer: Arc<dyn Tokenizer>,
}

impl Bm25Ranker {
	pub fn new(config: Bm25Config, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
		config.validate()?;
		Ok(Self { config, tokenizer })
	}

	pub fn index(&self, chunks: &[Chunk]) -> Result<Bm25Index> {
		Bm25Index::build(chunks, &self.config, self.tokenizer.clone())
	}
}

impl Default for Bm25Ranker {
	fn default() -> Self {
		Self { config: Bm25Config::default(), tokenizer: Arc::new(MixedScriptTokenizer) }
	}
}

impl Retriever for Bm25Ranker {
	fn retrieve(&self, query: &str, chunks: &[Chunk], top_k: usize, min_score: Option<f32>) -> Result<Vec<ScoredCandidate>> {
		if chunks.is_empty() || top_k == 0 {
			return Ok(Vec::new());
		}
		Ok(self.index(chunks)?.search(query, top_k, min_score))
	}
}
