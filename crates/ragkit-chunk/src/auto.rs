use std::fmt;
use std::sync::Arc;

use tracing::debug;

use ragkit_core::config::{ChunkConfig, SemanticConfig};
use ragkit_core::traits::Embedder;
use ragkit_core::{Chunk, Document, Result};

use crate::hybrid::HybridChunker;
use crate::recursive::RecursiveChunker;
use crate::semantic::{SemanticChunker, SemanticComplexity};
use crate::Chunker;

/// Texts shorter than this many characters always go to the recursive chunker.
pub const DEFAULT_MIN_ANALYZED_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    Recursive,
    Semantic,
    Hybrid,
}

impl ChunkStrategy {
    pub fn for_complexity(complexity: SemanticComplexity) -> Self {
        match complexity {
            SemanticComplexity::Low => Self::Recursive,
            SemanticComplexity::Medium => Self::Hybrid,
            SemanticComplexity::High => Self::Semantic,
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recursive => f.write_str("recursive"),
            Self::Semantic => f.write_str("semantic"),
            Self::Hybrid => f.write_str("hybrid"),
        }
    }
}

/// Picks recursive, hybrid or semantic chunking per text from the mean
/// similarity of adjacent sentences: coherent text is split recursively,
/// mixed text with the hybrid chunker, topic-hopping text semantically.
pub struct AutoChunker {
    recursive: RecursiveChunker,
    semantic: SemanticChunker,
    hybrid: HybridChunker,
    min_analyzed_chars: usize,
}

impl AutoChunker {
    pub fn new(config: ChunkConfig, semantic: SemanticConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Ok(Self {
            recursive: RecursiveChunker::new(config.clone())?,
            semantic: SemanticChunker::new(config.clone(), semantic.clone(), embedder.clone())?,
            hybrid: HybridChunker::new(config, semantic, embedder)?,
            min_analyzed_chars: DEFAULT_MIN_ANALYZED_CHARS,
        })
    }

    #[must_use]
    pub fn with_min_analyzed_chars(mut self, min_analyzed_chars: usize) -> Self {
        self.min_analyzed_chars = min_analyzed_chars;
        self
    }

    /// Strategy for `text`. Short texts skip the embedding call.
    pub fn select(&self, text: &str) -> Result<ChunkStrategy> {
        if text.chars().count() < self.min_analyzed_chars {
            return Ok(ChunkStrategy::Recursive);
        }
        let analysis = self.semantic.analyze(text)?;
        let strategy = ChunkStrategy::for_complexity(analysis.complexity);
        debug!(
            sentences = analysis.sentence_count,
            avg_similarity = ?analysis.avg_similarity,
            %strategy,
            "chunk strategy selected"
        );
        Ok(strategy)
    }

    fn chunker(&self, strategy: ChunkStrategy) -> &dyn Chunker {
        match strategy {
            ChunkStrategy::Recursive => &self.recursive,
            ChunkStrategy::Semantic => &self.semantic,
            ChunkStrategy::Hybrid => &self.hybrid,
        }
    }
}

impl Chunker for AutoChunker {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        self.chunker(self.select(text)?).chunk(text)
    }

    /// Delegates so `metadata.chunker` names the strategy actually used.
    fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        self.chunker(self.select(&document.content)?).chunk_document(document)
    }
}
