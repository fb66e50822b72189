use proptest::prelude::*;

use ragkit_core::config::FusionMethod;
use ragkit_core::{Chunk, ScoredCandidate};
use ragkit_hybrid::fuse;

fn ranked(items: &[(&str, f32)]) -> Vec<ScoredCandidate> {
    items.iter().map(|(c, s)| ScoredCandidate::new(Chunk::new(*c), *s)).collect()
}

fn weighted() -> FusionMethod {
    FusionMethod::weighted(0.5, 0.5).unwrap()
}

#[test]
fn weighted_min_max_with_absent_terms() {
    let lexical = ranked(&[("a", 10.0), ("b", 5.0), ("c", 0.0)]);
    let vector = ranked(&[("c", 1.0), ("a", 0.5)]);
    let fused = fuse(&lexical, &vector, &weighted());

    let order: Vec<_> = fused.iter().map(|r| r.chunk.content.as_str()).collect();
    assert_eq!(order, vec!["a", "c", "b"]);
    assert_eq!(fused.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!((fused[0].score - 0.5).abs() < 1e-6);
    assert!((fused[2].score - 0.25).abs() < 1e-6);
    assert_eq!(fused[2].lexical_score, Some(0.5));
    assert_eq!(fused[2].vector_score, None);
}

#[test]
fn equal_scores_normalize_to_one() {
    let fused = fuse(&ranked(&[("a", 3.0), ("b", 3.0)]), &[], &weighted());
    assert!(fused.iter().all(|r| (r.score - 0.5).abs() < 1e-6));
    assert_eq!(fused[0].chunk.content, "a");
}

#[test]
fn empty_rankings_fuse_to_nothing() {
    assert!(fuse(&[], &[], &weighted()).is_empty());
    assert!(fuse(&[], &[], &FusionMethod::rrf(60.0).unwrap()).is_empty());
}

#[test]
fn rrf_is_symmetric_in_rank_positions() {
    let lexical = ranked(&[("X", 9.0), ("A", 5.0), ("Y", 1.0)]);
    let vector = ranked(&[("Y", 0.9), ("B", 0.5), ("X", 0.1)]);
    let fused = fuse(&lexical, &vector, &FusionMethod::rrf(60.0).unwrap());
    let score = |name: &str| fused.iter().find(|r| r.chunk.content == name).unwrap().score;
    assert_eq!(score("X"), score("Y"));
    assert!((score("X") - (1.0 / 61.0 + 1.0 / 63.0)).abs() < 1e-6);
    assert!((score("A") - 1.0 / 62.0).abs() < 1e-6);
}

#[test]
fn first_occurrence_wins_and_ids_take_precedence() {
    let lexical = ranked(&[("a", 5.0), ("a", 1.0), ("b", 0.0)]);
    let fused = fuse(&lexical, &[], &weighted());
    assert_eq!(fused.len(), 2);
    assert_eq!(fused[0].lexical_score, Some(1.0));

    let lex = vec![ScoredCandidate::new(Chunk::new("old text").with_id("doc-1"), 2.0)];
    let vec = vec![ScoredCandidate::new(Chunk::new("new text").with_id("doc-1"), 0.7)];
    let fused = fuse(&lex, &vec, &weighted());
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].chunk.content, "old text");
    assert!((fused[0].score - 1.0).abs() < 1e-6);
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("doc{i}")).collect()
}

#[test]
fn rrf_strictly_prefers_a_chunk_ahead_in_both_lists() {
    let lexical = ranked(&[("X", 3.0), ("Y", 2.0), ("Z", 1.0)]);
    let vector = ranked(&[("Z", 0.9), ("X", 0.5), ("Y", 0.1)]);
    let fused = fuse(&lexical, &vector, &FusionMethod::rrf(60.0).unwrap());
    let score = |name: &str| fused.iter().find(|r| r.chunk.content == name).unwrap().score;
    assert!(score("X") > score("Y"));
    assert!((score("X") - (1.0 / 61.0 + 1.0 / 62.0)).abs() < 1e-6);
}

proptest! {
    #[test]
    fn fusing_a_ranking_with_itself_preserves_order(scores in prop::collection::vec(0.0f32..100.0, 1..20)) {
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let list: Vec<_> = names(sorted.len()).into_iter().zip(sorted).map(|(n, s)| ScoredCandidate::new(Chunk::new(n), s)).collect();
        for method in [weighted(), FusionMethod::rrf(60.0).unwrap()] {
            let fused = fuse(&list, &list, &method);
            let got: Vec<_> = fused.iter().map(|r| r.chunk.content.clone()).collect();
            let want: Vec<_> = list.iter().map(|c| c.chunk.content.clone()).collect();
            prop_assert_eq!(got, want);
        }
    }

    #[test]
    fn rrf_never_penalizes_a_better_rank(
        lexical in Just(names(8)).prop_shuffle(),
        vector in Just(names(8)).prop_shuffle(),
        pick in 0usize..8,
    ) {
        let method = FusionMethod::rrf(60.0).unwrap();
        let to_ranked = |order: &[String]| order.iter().map(|n| ScoredCandidate::new(Chunk::new(n.as_str()), 0.0)).collect::<Vec<_>>();
        let target = lexical[pick].clone();
        let score_of = |lex: &[String]| {
            fuse(&to_ranked(lex), &to_ranked(&vector), &method).into_iter().find(|r| r.chunk.content == target).map(|r| r.score)
        };

        let before = score_of(&lexical).unwrap();
        let mut promoted = lexical.clone();
        if pick > 0 {
            promoted.swap(pick, pick - 1);
        }
        let after = score_of(&promoted).unwrap();
        prop_assert!(after >= before);
    }

    #[test]
    fn rrf_scores_chunks_ahead_in_both_lists_strictly_higher(
        lexical in Just(names(8)).prop_shuffle(),
        vector in Just(names(8)).prop_shuffle(),
    ) {
        let to_ranked = |order: &[String]| order.iter().map(|n| ScoredCandidate::new(Chunk::new(n.as_str()), 0.0)).collect::<Vec<_>>();
        let fused = fuse(&to_ranked(&lexical), &to_ranked(&vector), &FusionMethod::rrf(60.0).unwrap());
        let position = |order: &[String], name: &str| order.iter().position(|n| n == name).unwrap();
        let score = |name: &str| fused.iter().find(|r| r.chunk.content == name).unwrap().score;

        for a in &lexical {
            for b in &lexical {
                if position(&lexical, a) < position(&lexical, b) && position(&vector, a) < position(&vector, b) {
                    prop_assert!(score(a) > score(b), "{} should outrank {}", a, b);
                }
            }
        }
    }
}
