//! ragkit-embed
//!
//! Model-free embedding and token counting helpers: a deterministic
//! feature-hashing embedder and a HuggingFace `tokenizer.json` length function.
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::debug;
use twox_hash::XxHash64;

use ragkit_core::length::is_cjk;
use ragkit_core::traits::Embedder;
use ragkit_core::vector_math::l2_normalize;

pub mod tokenize;

pub use tokenize::TokenizerLength;

/// Deterministic bag-of-words embedder. Each lowercased word (and each CJK
/// character) is hashed into one of `dim` buckets; the result is L2-normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { return Err(anyhow!("embedding dimension must be greater than 0")); }
        Ok(Self { dim, id: format!("hash-xx64-{dim}") })
    }

    pub fn dim(&self) -> usize { self.dim }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in features(text).enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        l2_normalize(&mut v);
        v
    }
}

fn features(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().flat_map(|word| {
        let mut out = Vec::new();
        let mut rest = String::new();
        for c in word.chars() {
            if is_cjk(c) {
                out.push(c.to_string());
            } else if c.is_alphanumeric() {
                rest.extend(c.to_lowercase());
            }
        }
        if !rest.is_empty() { out.push(rest); }
        out
    })
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(batch = texts.len(), dim = self.dim, "hash embedding batch");
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn embedder_id(&self) -> &str { &self.id }
}

/// The embedder used when no model is configured.
pub fn get_default_embedder(dim: usize) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(HashEmbedder::new(dim)?))
}
