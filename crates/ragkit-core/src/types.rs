//! Domain types shared by chunkers, rankers and fusion.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// A source document handed to a chunker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into(), metadata: Meta::new() }
    }
}

/// A retrieval unit produced by a chunker.
///
/// - `content`: the text payload, never empty when produced by a chunker
/// - `metadata`: opaque to rankers, carried through fusion and reranking
/// - `id`: caller-supplied identity; fusion falls back to `content` without it
/// - `start_index`: byte offset of `content` inside the chunked text, when tracked
/// - `embedding`: precomputed vector consumed by the vector ranker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChunkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<ChunkId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Meta) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = Some(start_index);
        self
    }

    /// Identity used when merging rankings: `id` if present, else the exact content.
    pub fn key(&self) -> ChunkKey<'_> {
        match &self.id {
            Some(id) => ChunkKey::Id(id),
            None => ChunkKey::Content(&self.content),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKey<'a> {
    Id(&'a str),
    Content(&'a str),
}

/// One ranker's verdict on a chunk. `score` is ranker-specific; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub chunk: Chunk,
    pub score: f32,
}

impl ScoredCandidate {
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }
}

/// Output of the fusion engine. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub chunk: Chunk,
    pub score: f32,
    pub rank: usize,
    /// Contribution of the lexical ranking before weighting, if the chunk appeared there.
    pub lexical_score: Option<f32>,
    /// Contribution of the vector ranking before weighting, if the chunk appeared there.
    pub vector_score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankedResult {
    pub chunk: Chunk,
    /// Score the item carried into reranking (fused or ranker score), if any.
    pub score: Option<f32>,
    pub rerank_score: f32,
    pub rank: usize,
}

/// Sort descending by score, keeping input order for equal scores.
pub fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f32) {
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

/// Apply the `min_score` filter, then truncate to `top_k`.
pub fn filter_and_truncate<T>(
    items: Vec<T>,
    top_k: usize,
    min_score: Option<f32>,
    score: impl Fn(&T) -> f32,
) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| min_score.map_or(true, |min| score(item) >= min))
        .take(top_k)
        .collect()
}
