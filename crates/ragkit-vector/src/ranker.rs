use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use ragkit_core::config::{SimilarityMetric, VectorConfig};
use ragkit_core::traits::{Embedder, Retriever};
use ragkit_core::types::{filter_and_truncate, sort_by_score_desc};
use ragkit_core::{Chunk, Error, Result, ScoredCandidate};

use crate::similarity::similarity;

/// Scores chunks by similarity between the query embedding and each
/// chunk's embedding.
#[derive(Clone)]
pub struct VectorRanker {
    embedder: Arc<dyn Embedder>,
    config: VectorConfig,
}

impl VectorRanker {
    pub fn new(embedder: Arc<dyn Embedder>, config: VectorConfig) -> Self {
        Self { embedder, config }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.config.metric
    }
}

impl Retriever for VectorRanker {
    fn retrieve(&self, query: &str, chunks: &[Chunk], top_k: usize, min_score: Option<f32>) -> Result<Vec<ScoredCandidate>> {
        if chunks.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        // Query and any missing chunk vectors go out in one batch.
        let missing: Vec<usize> = if self.config.embed_missing {
            chunks.iter().enumerate().filter(|(_, c)| c.embedding.is_none()).map(|(i, _)| i).collect()
        } else {
            Vec::new()
        };
        let mut batch = Vec::with_capacity(missing.len() + 1);
        batch.push(query.to_string());
        batch.extend(missing.iter().map(|&i| chunks[i].content.clone()));

        let vectors = self.embedder.embed_batch(&batch)?;
        if vectors.len() != batch.len() {
            return Err(Error::EmbeddingCount { expected: batch.len(), got: vectors.len() });
        }
        let mut vectors = vectors.into_iter();
        let Some(query_vec) = vectors.next() else {
            return Err(Error::EmbeddingCount { expected: batch.len(), got: 0 });
        };
        let fresh: HashMap<usize, Vec<f32>> = missing.into_iter().zip(vectors).collect();

        let mut skipped = 0usize;
        let mut mismatched = 0usize;
        let mut ranked = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let Some(embedding) = chunk.embedding.as_ref().or_else(|| fresh.get(&i)) else {
                skipped += 1;
                continue;
            };
            if embedding.len() != query_vec.len() {
                mismatched += 1;
                continue;
            }
            ranked.push(ScoredCandidate::new(chunk.clone(), similarity(self.config.metric, &query_vec, embedding)));
        }
        if skipped > 0 {
            warn!(skipped, "chunks without embeddings were skipped");
        }
        if mismatched > 0 {
            warn!(mismatched, expected = query_vec.len(), "chunks with mismatched embedding dimension were skipped");
        }

        sort_by_score_desc(&mut ranked, |c| c.score);
        debug!(candidates = ranked.len(), metric = ?self.config.metric, "vector ranking complete");
        Ok(filter_and_truncate(ranked, top_k, min_score, |c| c.score))
    }
}
