use ragkit_core::config::{ChunkConfig, FusionConfig, FusionKind, FusionMethod, SimilarityMetric};
use ragkit_core::length::{CharLength, EstimatedTokens, LengthType};
use ragkit_core::traits::LengthFunction;
use ragkit_core::types::{filter_and_truncate, sort_by_score_desc};
use ragkit_core::{Chunk, ChunkKey, Error};

#[test]
fn chunk_config_rejects_overlap_not_smaller_than_size() {
    assert!(ChunkConfig::new(100, 20).is_ok());
    let err = ChunkConfig::new(100, 100).expect_err("overlap == size");
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(ChunkConfig::new(0, 0).is_err(), "zero chunk_size is rejected");
}

#[test]
fn length_type_parses_known_names_only() {
    assert_eq!("char".parse::<LengthType>().unwrap(), LengthType::Char);
    assert_eq!("TOKEN".parse::<LengthType>().unwrap(), LengthType::Token);
    assert!(matches!("bytes".parse::<LengthType>(), Err(Error::InvalidConfig(_))));
}

#[test]
fn metric_and_fusion_names_fail_fast() {
    assert_eq!("dot_product".parse::<SimilarityMetric>().unwrap(), SimilarityMetric::Dot);
    assert_eq!("l2".parse::<SimilarityMetric>().unwrap(), SimilarityMetric::NegEuclidean);
    assert!("manhattan".parse::<SimilarityMetric>().is_err());
    assert_eq!("rrf".parse::<FusionKind>().unwrap(), FusionKind::Rrf);
    assert!("borda".parse::<FusionKind>().is_err());
}

#[test]
fn fusion_config_validates_parameters() {
    let rrf = FusionConfig { method: FusionKind::Rrf, rrf_k: 60.0, ..FusionConfig::default() };
    assert_eq!(rrf.fusion_method().unwrap(), FusionMethod::Rrf { k: 60.0 });
    let bad_k = FusionConfig { method: FusionKind::Rrf, rrf_k: 0.0, ..FusionConfig::default() };
    assert!(bad_k.fusion_method().is_err());
    let bad_weight = FusionConfig { lexical_weight: -1.0, ..FusionConfig::default() };
    assert!(bad_weight.fusion_method().is_err());
}

#[test]
fn char_and_estimated_token_lengths() {
    assert_eq!(CharLength.length("héllo"), 5);
    assert_eq!(CharLength.length("你好"), 2);
    // two CJK characters + one latin word (1.3 truncated to 1)
    assert_eq!(EstimatedTokens.length("你好 world"), 3);
    assert_eq!(EstimatedTokens.length("   "), 0);
}

#[test]
fn chunk_key_prefers_id_over_content() {
    let with_id = Chunk::new("same text").with_id("c1");
    let without_id = Chunk::new("same text");
    assert_eq!(with_id.key(), ChunkKey::Id("c1"));
    assert_eq!(without_id.key(), ChunkKey::Content("same text"));
    assert_ne!(with_id.key(), without_id.key());
}

#[test]
fn sort_is_stable_and_filter_runs_before_truncate() {
    let mut items = vec![("a", 1.0f32), ("b", 3.0), ("c", 1.0), ("d", 3.0)];
    sort_by_score_desc(&mut items, |i| i.1);
    let order: Vec<&str> = items.iter().map(|i| i.0).collect();
    assert_eq!(order, ["b", "d", "a", "c"]);

    let kept = filter_and_truncate(items, 3, Some(2.0), |i| i.1);
    assert_eq!(kept.len(), 2, "only two items reach the threshold");
}
