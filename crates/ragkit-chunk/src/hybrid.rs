use std::sync::Arc;

use tracing::debug;

use ragkit_core::config::{ChunkConfig, SemanticConfig};
use ragkit_core::traits::{Embedder, LengthFunction};
use ragkit_core::{Chunk, Error, Result};

use crate::recursive::RecursiveChunker;
use crate::semantic::SemanticChunker;

pub const DEFAULT_MAX_CHUNK_SIZE_MULTIPLIER: f32 = 1.5;

/// Semantic grouping first; any group longer than
/// `chunk_size * max_chunk_size_multiplier` is re-split recursively.
pub struct HybridChunker {
    semantic: SemanticChunker,
    recursive: RecursiveChunker,
    length: Arc<dyn LengthFunction>,
    limit: usize,
}

impl HybridChunker {
    pub fn new(config: ChunkConfig, semantic: SemanticConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::with_multiplier(config, semantic, embedder, DEFAULT_MAX_CHUNK_SIZE_MULTIPLIER)
    }

    pub fn with_multiplier(
        config: ChunkConfig,
        semantic: SemanticConfig,
        embedder: Arc<dyn Embedder>,
        max_chunk_size_multiplier: f32,
    ) -> Result<Self> {
        if !(max_chunk_size_multiplier.is_finite() && max_chunk_size_multiplier >= 1.0) {
            return Err(Error::invalid_config(format!(
                "max_chunk_size_multiplier must be >= 1.0, got {max_chunk_size_multiplier}"
            )));
        }
        let recursive = RecursiveChunker::new(config.clone())?;
        // Grouping is unbounded here; the limit below is enforced instead.
        let semantic = SemanticChunker::new(ChunkConfig { chunk_size: usize::MAX, ..config.clone() }, semantic, embedder)?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let limit = (config.chunk_size as f32 * max_chunk_size_multiplier) as usize;
        Ok(Self { semantic, recursive, length: config.length_type.function(), limit })
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        let mut out = Vec::new();
        let mut resplit = 0usize;
        for chunk in self.semantic.chunk(text)? {
            if self.length.length(&chunk.content) <= self.limit {
                out.push(chunk);
                continue;
            }
            resplit += 1;
            let base = chunk.start_index;
            out.extend(self.recursive.chunk(&chunk.content).into_iter().map(|mut piece| {
                piece.start_index = match (base, piece.start_index) {
                    (Some(base), Some(offset)) => Some(base + offset),
                    _ => None,
                };
                piece
            }));
        }
        debug!(chunks = out.len(), resplit, "hybrid chunking complete");
        Ok(out)
    }
}
