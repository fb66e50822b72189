use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED};
use tantivy::{doc, Index, IndexReader, IndexWriter, TantivyDocument};
use tracing::{debug, warn};

use ragkit_core::types::filter_and_truncate;
use ragkit_core::{Chunk, Error, Result, ScoredCandidate};

use crate::tokenize::build_analyzer;
use crate::LexicalIndex;

const TOKENIZER_NAME: &str = "text_with_stopwords";

fn index_err(e: impl std::fmt::Display) -> Error {
	Error::Index(e.to_string())
}

/// In-RAM tantivy index over a fixed chunk set. Scores are tantivy's BM25.
pub struct TantivyIndex {
	index: Index,
	reader: IndexReader,
	text_field: Field,
	ord_field: Field,
	chunks: Vec<Chunk>,
}

impl TantivyIndex {
	pub fn build(chunks: &[Chunk]) -> Result<Self> {
		let mut schema_builder = Schema::builder();
		let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqsAndPositions);
		let text_field = schema_builder.add_text_field("text", TextOptions::default().set_indexing_options(text_field_indexing));
		let ord_field = schema_builder.add_u64_field("ord", STORED);
		let schema = schema_builder.build();

		let index = Index::create_in_ram(schema);
		index.tokenizers().register(TOKENIZER_NAME, build_analyzer(true));

		// Single thread keeps document order (and tie order) deterministic.
		let mut writer: IndexWriter = index.writer_with_num_threads(1, 50_000_000).map_err(index_err)?;
		for (ord, chunk) in chunks.iter().enumerate() {
			writer.add_document(doc!(text_field => chunk.content.clone(), ord_field => ord as u64)).map_err(index_err)?;
		}
		writer.commit().map_err(index_err)?;
		let reader = index.reader().map_err(index_err)?;
		debug!(chunks = chunks.len(), "tantivy index built");
		Ok(Self { index, reader, text_field, ord_field, chunks: chunks.to_vec() })
	}

	pub fn search(&self, query: &str, top_k: usize, min_score: Option<f32>) -> Result<Vec<ScoredCandidate>> {
		if top_k == 0 || self.chunks.is_empty() || query.trim().is_empty() {
			return Ok(Vec::new());
		}
		let searcher = self.reader.searcher();
		let parser = QueryParser::for_index(&self.index, vec![self.text_field]);
		let (parsed, errors) = parser.parse_query_lenient(query);
		if !errors.is_empty() {
			warn!(errors = errors.len(), "query parsed leniently");
		}

		// Fetch everything so ties can be re-ordered by insertion order.
		let top_docs = searcher.search(&parsed, &TopDocs::with_limit(self.chunks.len())).map_err(index_err)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(index_err)?;
			let ord = doc.get_first(self.ord_field).and_then(|v| v.as_u64()).ok_or_else(|| index_err("document without ordinal"))?;
			hits.push((score, usize::try_from(ord).map_err(index_err)?));
		}
		hits.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

		let ranked = hits.into_iter().filter_map(|(score, ord)| self.chunks.get(ord).map(|c| ScoredCandidate::new(c.clone(), score))).collect();
		Ok(filter_and_truncate(ranked, top_k, min_score, |c| c.score))
	}
}

impl LexicalIndex for TantivyIndex {
	fn search(&self, query: &str, top_k: usize, min_score: Option<f32>) -> Result<Vec<ScoredCandidate>> {
		TantivyIndex::search(self, query, top_k, min_score)
	}

	fn len(&self) -> usize {
		self.chunks.len()
	}
}
