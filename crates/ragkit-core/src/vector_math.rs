//! Dense vector helpers shared by the semantic chunker and the vector ranker.

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// Cosine similarity; `0.0` when either vector has zero norm.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom <= f32::EPSILON { 0.0 } else { dot(a, b) / denom }
}

/// Euclidean distance between the L2-normalized forms of `a` and `b`, in `[0, 2]`.
pub fn normalized_euclidean(a: &[f32], b: &[f32]) -> f32 {
    let (na, nb) = (norm(a).max(f32::EPSILON), norm(b).max(f32::EPSILON));
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x / na - y / nb;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

pub fn l2_normalize(v: &mut [f32]) {
    let n = norm(v).max(1e-6);
    for x in v.iter_mut() {
        *x /= n;
    }
}
