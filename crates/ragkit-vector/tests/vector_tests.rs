use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ragkit_core::config::{SimilarityMetric, VectorConfig};
use ragkit_core::traits::{Embedder, FnEmbedder, Retriever};
use ragkit_core::{Chunk, Error};
use ragkit_embed::HashEmbedder;
use ragkit_vector::{similarity, CachedEmbedder, VectorRanker};

fn axis_embedder() -> Arc<dyn Embedder> {
    Arc::new(FnEmbedder::new(|texts: &[String]| {
        Ok(texts.iter().map(|t| if t.contains("north") { vec![0.0, 1.0] } else { vec![1.0, 0.0] }).collect())
    }))
}

fn config(metric: SimilarityMetric) -> VectorConfig {
    VectorConfig { metric, embed_missing: true }
}

#[test]
fn metrics_rank_higher_as_better() {
    let a = [1.0, 0.0];
    assert!((similarity(SimilarityMetric::Cosine, &a, &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!((similarity(SimilarityMetric::Dot, &a, &[2.0, 0.0]) - 2.0).abs() < 1e-6);
    assert!(similarity(SimilarityMetric::NegEuclidean, &a, &[3.0, 0.0]).abs() < 1e-6);
    let far = similarity(SimilarityMetric::NegEuclidean, &a, &[-1.0, 0.0]);
    assert!((far + 2.0).abs() < 1e-6);
}

#[test]
fn precomputed_embeddings_are_used() {
    let chunks = vec![
        Chunk::new("east").with_embedding(vec![1.0, 0.0]),
        Chunk::new("north").with_embedding(vec![0.0, 1.0]),
    ];
    let ranker = VectorRanker::new(axis_embedder(), config(SimilarityMetric::Cosine));
    let hits = ranker.retrieve("go north", &chunks, 2, None).unwrap();
    assert_eq!(hits[0].chunk.content, "north");
    assert!((hits[0].score - 1.0).abs() < 1e-6);
    assert!(hits[1].score.abs() < 1e-6);
}

#[test]
fn missing_embeddings_are_batched_with_query() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let embedder: Arc<dyn Embedder> = Arc::new(FnEmbedder::new(move |texts: &[String]| {
        seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(texts.len(), 3);
        Ok(texts.iter().map(|t| if t.contains("north") { vec![0.0, 1.0] } else { vec![1.0, 0.0] }).collect())
    }));
    let chunks = vec![Chunk::new("east side"), Chunk::new("north side"), Chunk::new("x").with_embedding(vec![0.5, 0.5])];
    let hits = VectorRanker::new(embedder, config(SimilarityMetric::Cosine)).retrieve("north", &chunks, 3, None).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(hits[0].chunk.content, "north side");
    assert_eq!(hits.len(), 3);
}

#[test]
fn unembedded_and_mismatched_chunks_are_skipped() {
    let chunks = vec![Chunk::new("east"), Chunk::new("bad").with_embedding(vec![1.0, 0.0, 0.0]), Chunk::new("ok").with_embedding(vec![1.0, 0.0])];
    let ranker = VectorRanker::new(axis_embedder(), VectorConfig { metric: SimilarityMetric::Dot, embed_missing: false });
    let hits = ranker.retrieve("east", &chunks, 10, None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.content, "ok");
}

#[test]
fn count_mismatch_and_failures_surface() {
    let broken: Arc<dyn Embedder> = Arc::new(FnEmbedder::new(|_: &[String]| Ok(Vec::new())));
    let err = VectorRanker::new(broken, VectorConfig::default()).retrieve("q", &[Chunk::new("a")], 1, None).unwrap_err();
    assert!(matches!(err, Error::EmbeddingCount { expected: 2, got: 0 }));

    let failing: Arc<dyn Embedder> = Arc::new(FnEmbedder::new(|_: &[String]| anyhow::bail!("gpu gone")));
    let err = VectorRanker::new(failing, VectorConfig::default()).retrieve("q", &[Chunk::new("a")], 1, None).unwrap_err();
    assert_eq!(err.to_string(), "gpu gone");
}

#[test]
fn ties_filter_and_truncate() {
    let chunks: Vec<_> = ["a", "b", "c"].iter().map(|t| Chunk::new(*t).with_embedding(vec![1.0, 0.0])).collect();
    let ranker = VectorRanker::new(axis_embedder(), VectorConfig::default());
    let hits = ranker.retrieve("q", &chunks, 2, None).unwrap();
    let order: Vec<_> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert_eq!(order, vec!["a", "b"]);
    assert!(ranker.retrieve("q", &chunks, 3, Some(1.5)).unwrap().is_empty());
    assert!(ranker.retrieve("q", &[], 3, None).unwrap().is_empty());
}

#[test]
fn cached_embedder_only_embeds_misses() {
    let cached = CachedEmbedder::new(HashEmbedder::new(32).unwrap());
    let first = cached.embed_batch(&["alpha".to_string(), "beta".to_string()]).unwrap();
    assert_eq!(cached.cache().len(), 2);
    let second = cached.embed_batch(&["beta".to_string(), "gamma".to_string()]).unwrap();
    assert_eq!(cached.cache().len(), 3);
    assert_eq!(first[1], second[0]);
    assert_eq!(cached.embedder_id(), "hash-xx64-32");
}
