use std::sync::Arc;

use ragkit_chunk::{AutoChunker, ChunkStrategy, Chunker};
use ragkit_core::config::{ChunkConfig, SemanticConfig};
use ragkit_core::traits::{Embedder, FnEmbedder};
use ragkit_core::{Document, Error};
use serde_json::json;

const TEXT: &str = "Cats purr. The cat sleeps. Stocks fell today. Markets are volatile.";

fn embedder(f: fn(usize, &str) -> Vec<f32>) -> Arc<dyn Embedder> {
    Arc::new(FnEmbedder::new(move |texts: &[String]| {
        Ok(texts.iter().enumerate().map(|(i, t)| f(i, t)).collect())
    }))
}

fn auto(embedder: Arc<dyn Embedder>) -> AutoChunker {
    let semantic = SemanticConfig { similarity_threshold: 0.5, min_chunk_size: 5 };
    AutoChunker::new(ChunkConfig::new(200, 0).unwrap(), semantic, embedder).unwrap().with_min_analyzed_chars(0)
}

fn constant(_: usize, _: &str) -> Vec<f32> {
    vec![1.0, 1.0]
}

fn topic(_: usize, t: &str) -> Vec<f32> {
    if t.to_lowercase().contains("cat") { vec![1.0, 0.0] } else { vec![0.0, 1.0] }
}

fn one_hot(i: usize, _: &str) -> Vec<f32> {
    let mut v = vec![0.0; 8];
    v[i] = 1.0;
    v
}

#[test]
fn coherent_text_is_split_recursively() {
    assert_eq!(auto(embedder(constant)).select(TEXT).unwrap(), ChunkStrategy::Recursive);
}

#[test]
fn mixed_text_uses_hybrid() {
    assert_eq!(auto(embedder(topic)).select(TEXT).unwrap(), ChunkStrategy::Hybrid);
}

#[test]
fn unrelated_sentences_use_semantic() {
    let chunker = auto(embedder(one_hot));
    assert_eq!(chunker.select(TEXT).unwrap(), ChunkStrategy::Semantic);
    assert_eq!(Chunker::chunk(&chunker, TEXT).unwrap().len(), 4);
}

#[test]
fn short_text_skips_analysis() {
    let failing: Arc<dyn Embedder> = Arc::new(FnEmbedder::new(|_: &[String]| anyhow::bail!("not expected")));
    let semantic = SemanticConfig { similarity_threshold: 0.5, min_chunk_size: 5 };
    let chunker = AutoChunker::new(ChunkConfig::new(200, 0).unwrap(), semantic, failing).unwrap();
    assert_eq!(chunker.select(TEXT).unwrap(), ChunkStrategy::Recursive);
    assert_eq!(Chunker::chunk(&chunker, TEXT).unwrap()[0].content, TEXT);
}

#[test]
fn embedder_failure_during_analysis_propagates() {
    let failing: Arc<dyn Embedder> = Arc::new(FnEmbedder::new(|_: &[String]| anyhow::bail!("backend offline")));
    let err = auto(failing).select(TEXT).unwrap_err();
    assert!(matches!(err, Error::External(_)));
}

#[test]
fn documents_record_the_selected_strategy() {
    let chunks = auto(embedder(one_hot)).chunk_document(&Document::new("doc", TEXT)).unwrap();
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[0].metadata["chunker"], json!("semantic"));
    assert_eq!(chunks[3].id.as_deref(), Some("doc_chunk_3"));
    assert_eq!(ChunkStrategy::Semantic.to_string(), "semantic");
}
