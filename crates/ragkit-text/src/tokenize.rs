use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

use ragkit_core::length::is_cjk;
use ragkit_core::traits::Tokenizer;

pub const STOP_WORDS: &[&str] = &[
	"a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
	"has", "he", "in", "is", "it", "its", "of", "on", "that", "the",
	"to", "was", "will", "with", "or", "but", "not", "this", "these", "they",
	"them", "their", "there", "then", "than", "so", "if", "when", "where", "why",
	"how", "what", "which", "who", "whom", "whose", "can", "could", "should", "would",
	"may", "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

/// Lowercased alphanumeric words; every CJK character is its own term.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedScriptTokenizer;

impl Tokenizer for MixedScriptTokenizer {
	fn tokenize(&self, text: &str) -> Vec<String> {
		let mut tokens = Vec::new();
		let mut word = String::new();
		for c in text.chars() {
			if is_cjk(c) {
				if !word.is_empty() { tokens.push(std::mem::take(&mut word)); }
				tokens.push(c.to_string());
			} else if c.is_alphanumeric() {
				word.extend(c.to_lowercase());
			} else if !word.is_empty() {
				tokens.push(std::mem::take(&mut word));
			}
		}
		if !word.is_empty() { tokens.push(word); }
		tokens
	}
}

/// Tantivy analyzer chain: simple tokenizer, lowercasing and, optionally,
/// English stop-word removal. The same chain backs [`crate::TantivyIndex`].
#[derive(Clone)]
pub struct AnalyzerTokenizer {
	analyzer: TextAnalyzer,
}

impl AnalyzerTokenizer {
	pub fn new(remove_stop_words: bool) -> Self {
		Self { analyzer: build_analyzer(remove_stop_words) }
	}
}

impl Default for AnalyzerTokenizer {
	fn default() -> Self {
		Self::new(true)
	}
}

impl Tokenizer for AnalyzerTokenizer {
	fn tokenize(&self, text: &str) -> Vec<String> {
		// token_stream needs &mut; analyzers are cheap to clone.
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() {
			tokens.push(stream.token().text.clone());
		}
		tokens
	}
}

pub(crate) fn build_analyzer(remove_stop_words: bool) -> TextAnalyzer {
	if remove_stop_words {
		TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(LowerCaser)
			.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| (*s).to_string())))
			.build()
	} else {
		TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
	}
}
