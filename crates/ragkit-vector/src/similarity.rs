use ragkit_core::config::SimilarityMetric;
use ragkit_core::vector_math::{cosine, dot, normalized_euclidean};

/// Similarity under `metric`; higher is better for every metric.
pub fn similarity(metric: SimilarityMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        SimilarityMetric::Cosine => cosine(a, b),
        SimilarityMetric::Dot => dot(a, b),
        SimilarityMetric::NegEuclidean => -normalized_euclidean(a, b),
    }
}
