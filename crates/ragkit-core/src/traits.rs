use crate::types::{Chunk, ScoredCandidate};

/// Batched embedding provider. One vector per input, in input order.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Stable identifier for the provider/model, used to key caches.
    fn embedder_id(&self) -> &str {
        "anonymous"
    }
}

/// Pairwise relevance model: `(query, document) -> unnormalized score`.
pub trait PairwiseScorer: Send + Sync {
    fn score(&self, query: &str, document: &str) -> anyhow::Result<f32>;
}

/// Splits text into terms for lexical ranking.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Measures text in the unit the chunk budget is expressed in.
pub trait LengthFunction: Send + Sync {
    fn length(&self, text: &str) -> usize;
}

/// Stateless retrieval over a caller-supplied candidate set.
pub trait Retriever: Send + Sync {
    fn retrieve(
        &self,
        query: &str,
        chunks: &[Chunk],
        top_k: usize,
        min_score: Option<f32>,
    ) -> crate::Result<Vec<ScoredCandidate>>;
}

/// Adapts a closure into an [`Embedder`].
pub struct FnEmbedder<F> {
    func: F,
    id: String,
}

impl<F> FnEmbedder<F>
where
    F: Fn(&[String]) -> anyhow::Result<Vec<Vec<f32>>> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func, id: "fn".to_string() }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl<F> Embedder for FnEmbedder<F>
where
    F: Fn(&[String]) -> anyhow::Result<Vec<Vec<f32>>> + Send + Sync,
{
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        (self.func)(texts)
    }

    fn embedder_id(&self) -> &str {
        &self.id
    }
}

/// Adapts a closure into a [`PairwiseScorer`].
pub struct FnScorer<F>(pub F);

impl<F> FnScorer<F>
where
    F: Fn(&str, &str) -> anyhow::Result<f32> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self(func)
    }
}

impl<F> PairwiseScorer for FnScorer<F>
where
    F: Fn(&str, &str) -> anyhow::Result<f32> + Send + Sync,
{
    fn score(&self, query: &str, document: &str) -> anyhow::Result<f32> {
        (self.0)(query, document)
    }
}
