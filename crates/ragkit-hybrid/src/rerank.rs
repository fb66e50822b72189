use std::sync::Arc;

use tracing::debug;

use ragkit_core::config::{RerankConfig, ScoreNormalization};
use ragkit_core::traits::PairwiseScorer;
use ragkit_core::types::sort_by_score_desc;
use ragkit_core::{Chunk, Error, FusedResult, RerankedResult, Result, ScoredCandidate};

use crate::fusion::min_max;

/// Anything the reranker can score: a chunk plus an optional prior score.
pub trait Rankable {
    fn chunk(&self) -> &Chunk;

    fn prior_score(&self) -> Option<f32> {
        None
    }
}

impl Rankable for Chunk {
    fn chunk(&self) -> &Chunk {
        self
    }
}

impl Rankable for ScoredCandidate {
    fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    fn prior_score(&self) -> Option<f32> {
        Some(self.score)
    }
}

impl Rankable for FusedResult {
    fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    fn prior_score(&self) -> Option<f32> {
        Some(self.score)
    }
}

/// Second-pass ordering by a pairwise `(query, content)` relevance model.
#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn PairwiseScorer>,
    config: RerankConfig,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn PairwiseScorer>, config: RerankConfig) -> Self {
        Self { scorer, config }
    }

    /// Score every item once, normalize into `[0, 1]` and sort descending.
    /// `top_k` overrides the configured cut-off.
    pub fn rerank<T: Rankable>(&self, query: &str, items: &[T], top_k: Option<usize>) -> Result<Vec<RerankedResult>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut raw = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let score = self.scorer.score(query, &item.chunk().content)?;
            if !score.is_finite() {
                return Err(Error::NonFiniteScore(i));
            }
            raw.push(score);
        }

        let normalized = match self.config.normalization {
            ScoreNormalization::MinMax => min_max(&raw),
            ScoreNormalization::Sigmoid => raw.iter().map(|s| 1.0 / (1.0 + (-s).exp())).collect(),
        };

        let mut results: Vec<RerankedResult> = items
            .iter()
            .zip(normalized)
            .map(|(item, rerank_score)| RerankedResult {
                chunk: item.chunk().clone(),
                score: item.prior_score(),
                rerank_score,
                rank: 0,
            })
            .collect();
        sort_by_score_desc(&mut results, |r| r.rerank_score);
        if let Some(k) = top_k.or(self.config.top_k) {
            results.truncate(k);
        }
        for (i, r) in results.iter_mut().enumerate() {
            r.rank = i + 1;
        }
        debug!(items = items.len(), kept = results.len(), "rerank complete");
        Ok(results)
    }
}
