use std::collections::HashMap;

use tracing::debug;

use ragkit_core::config::FusionMethod;
use ragkit_core::types::sort_by_score_desc;
use ragkit_core::{Chunk, ChunkKey, FusedResult, ScoredCandidate};

struct Entry {
    chunk: Chunk,
    lexical: Option<f32>,
    vector: Option<f32>,
}

/// Merge a lexical and a vector ranking of the same candidate set.
///
/// Chunks are identified by `id`, falling back to exact content. Within one
/// ranking only the first occurrence of a chunk counts. Output is sorted by
/// fused score (ties keep first-seen order, lexical before vector) and ranked
/// from 1.
pub fn fuse(lexical: &[ScoredCandidate], vector: &[ScoredCandidate], method: &FusionMethod) -> Vec<FusedResult> {
    let mut entries: Vec<Entry> = Vec::with_capacity(lexical.len() + vector.len());
    let mut index: HashMap<ChunkKey<'_>, usize> = HashMap::new();

    let lexical_parts = contributions(lexical, method);
    let vector_parts = contributions(vector, method);

    for (list, parts, is_lexical) in [(lexical, &lexical_parts, true), (vector, &vector_parts, false)] {
        let mut seen = std::collections::HashSet::new();
        for (candidate, part) in list.iter().zip(parts) {
            let key = candidate.chunk.key();
            if !seen.insert(key) {
                continue;
            }
            let slot = *index.entry(key).or_insert_with(|| {
                entries.push(Entry { chunk: candidate.chunk.clone(), lexical: None, vector: None });
                entries.len() - 1
            });
            if is_lexical {
                entries[slot].lexical = Some(*part);
            } else {
                entries[slot].vector = Some(*part);
            }
        }
    }

    let mut fused: Vec<FusedResult> = entries
        .into_iter()
        .map(|e| {
            let score = match method {
                FusionMethod::Weighted { lexical_weight, vector_weight } => {
                    lexical_weight * e.lexical.unwrap_or(0.0) + vector_weight * e.vector.unwrap_or(0.0)
                }
                FusionMethod::Rrf { .. } => e.lexical.unwrap_or(0.0) + e.vector.unwrap_or(0.0),
            };
            FusedResult { chunk: e.chunk, score, rank: 0, lexical_score: e.lexical, vector_score: e.vector }
        })
        .collect();

    sort_by_score_desc(&mut fused, |r| r.score);
    for (i, r) in fused.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    debug!(lexical = lexical.len(), vector = vector.len(), fused = fused.len(), "fusion complete");
    fused
}

/// Per-position contribution of one ranking before weighting.
fn contributions(list: &[ScoredCandidate], method: &FusionMethod) -> Vec<f32> {
    match method {
        FusionMethod::Weighted { .. } => min_max(&list.iter().map(|c| c.score).collect::<Vec<_>>()),
        #[allow(clippy::cast_precision_loss)]
        FusionMethod::Rrf { k } => (1..=list.len()).map(|rank| 1.0 / (k + rank as f32)).collect(),
    }
}

/// Min-max scaling to `[0, 1]`. All-equal input maps to 1.0; non-finite
/// values are ignored for the bounds and clamped into range.
pub fn min_max(scores: &[f32]) -> Vec<f32> {
    let finite = scores.iter().copied().filter(|s| s.is_finite());
    let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| (lo.min(s), hi.max(s)));
    if min > max {
        return scores.iter().map(|s| if *s == f32::INFINITY { 1.0 } else { 0.0 }).collect();
    }
    let range = max - min;
    scores
        .iter()
        .map(|&s| {
            if s.is_nan() {
                0.0
            } else if range <= f32::EPSILON {
                1.0
            } else {
                ((s - min) / range).clamp(0.0, 1.0)
            }
        })
        .collect()
}
