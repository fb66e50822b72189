use std::sync::Arc;

use tracing::debug;

use ragkit_core::config::{FusionConfig, FusionMethod, Settings};
use ragkit_core::traits::{Embedder, Retriever};
use ragkit_core::{Chunk, Error, FusedResult, RerankedResult, Result, ScoredCandidate};
use ragkit_text::{Bm25Ranker, MixedScriptTokenizer};
use ragkit_vector::VectorRanker;

use crate::fusion::fuse;
use crate::rerank::Reranker;
use crate::scorer::TermOverlapScorer;

/// Lexical + vector retrieval over one candidate set, fused and optionally
/// reranked. Each ranker fetches `top_k * candidate_multiplier` candidates.
#[derive(Clone)]
pub struct HybridRetriever {
    lexical: Arc<dyn Retriever>,
    vector: Arc<dyn Retriever>,
    method: FusionMethod,
    candidate_multiplier: usize,
    reranker: Option<Reranker>,
}

impl HybridRetriever {
    pub fn new(lexical: Arc<dyn Retriever>, vector: Arc<dyn Retriever>, fusion: &FusionConfig) -> Result<Self> {
        let method = FusionMethod::from_config(fusion)?;
        if fusion.candidate_multiplier == 0 {
            return Err(Error::invalid_config("fusion.candidate_multiplier must be at least 1"));
        }
        Ok(Self { lexical, vector, method, candidate_multiplier: fusion.candidate_multiplier, reranker: None })
    }

    /// BM25 (mixed-script tokens) + vector ranking with `embedder`; the
    /// term-overlap reranker is attached when `rerank.enabled` is set.
    pub fn from_settings(settings: &Settings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let lexical = Bm25Ranker::new(settings.bm25.clone(), Arc::new(MixedScriptTokenizer))?;
        let vector = VectorRanker::new(embedder, settings.vector.clone());
        let retriever = Self::new(Arc::new(lexical), Arc::new(vector), &settings.fusion)?;
        Ok(if settings.rerank.enabled {
            retriever.with_reranker(Reranker::new(Arc::new(TermOverlapScorer), settings.rerank.clone()))
        } else {
            retriever
        })
    }

    #[must_use]
    pub fn with_reranker(mut self, reranker: Reranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn method(&self) -> &FusionMethod {
        &self.method
    }

    pub fn retrieve_fused(&self, query: &str, chunks: &[Chunk], top_k: usize, min_score: Option<f32>) -> Result<Vec<FusedResult>> {
        if chunks.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let fetch = top_k.saturating_mul(self.candidate_multiplier);
        let lexical = self.lexical.retrieve(query, chunks, fetch, None)?;
        let vector = self.vector.retrieve(query, chunks, fetch, None)?;

        let mut fused = fuse(&lexical, &vector, &self.method);
        if let Some(min) = min_score {
            fused.retain(|r| r.score >= min);
        }
        fused.truncate(top_k);
        debug!(lexical = lexical.len(), vector = vector.len(), returned = fused.len(), "hybrid retrieval");
        Ok(fused)
    }

    /// Fused retrieval followed by the configured reranker.
    pub fn retrieve_reranked(&self, query: &str, chunks: &[Chunk], top_k: usize, min_score: Option<f32>) -> Result<Vec<RerankedResult>> {
        let Some(reranker) = &self.reranker else {
            return Err(Error::invalid_config("no reranker configured"));
        };
        let fused = self.retrieve_fused(query, chunks, top_k, min_score)?;
        reranker.rerank(query, &fused, Some(top_k))
    }
}

impl Retriever for HybridRetriever {
    /// Scores are rerank scores when a reranker is attached, fused scores otherwise.
    fn retrieve(&self, query: &str, chunks: &[Chunk], top_k: usize, min_score: Option<f32>) -> Result<Vec<ScoredCandidate>> {
        if self.reranker.is_some() {
            Ok(self
                .retrieve_reranked(query, chunks, top_k, min_score)?
                .into_iter()
                .map(|r| ScoredCandidate::new(r.chunk, r.rerank_score))
                .collect())
        } else {
            Ok(self
                .retrieve_fused(query, chunks, top_k, min_score)?
                .into_iter()
                .map(|r| ScoredCandidate::new(r.chunk, r.score))
                .collect())
        }
    }
}
