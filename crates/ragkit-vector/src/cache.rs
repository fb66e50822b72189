use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use tracing::debug;

use ragkit_core::traits::Embedder;

pub fn hash_content(s: &str) -> String {
    let h = blake3::hash(s.as_bytes());
    h.to_hex().to_string()
}

/// In-memory vectors keyed by `(embedder_id, blake3(content))`.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<(String, String), Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, embedder_id: &str, content: &str) -> Result<Option<Vec<f32>>> {
        let entries = self.entries.read().map_err(|_| anyhow!("embedding cache lock poisoned"))?;
        Ok(entries.get(&(embedder_id.to_string(), hash_content(content))).cloned())
    }

    pub fn put(&self, embedder_id: &str, content: &str, vector: Vec<f32>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("embedding cache lock poisoned"))?;
        entries.insert((embedder_id.to_string(), hash_content(content)), vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write-through caching decorator. Misses are embedded in one batch.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: EmbeddingCache,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self { inner, cache: EmbeddingCache::new() }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let id = self.inner.embedder_id();
        let mut out: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut misses = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let hit = self.cache.get(id, text)?;
            if hit.is_none() { misses.push(i); }
            out.push(hit);
        }

        if !misses.is_empty() {
            let batch: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            let vectors = self.inner.embed_batch(&batch)?;
            if vectors.len() != batch.len() {
                return Err(anyhow!("embedder returned {} vectors for {} inputs", vectors.len(), batch.len()));
            }
            for (&i, vector) in misses.iter().zip(vectors) {
                self.cache.put(id, &texts[i], vector.clone())?;
                out[i] = Some(vector);
            }
        }
        debug!(batch = texts.len(), misses = misses.len(), "cached embedding batch");
        out.into_iter().map(|v| v.ok_or_else(|| anyhow!("missing embedding"))).collect()
    }

    fn embedder_id(&self) -> &str {
        self.inner.embedder_id()
    }
}
