use ragkit_core::traits::PairwiseScorer;

/// Fraction of the query's whitespace-separated words found in the document,
/// compared case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermOverlapScorer;

impl PairwiseScorer for TermOverlapScorer {
    fn score(&self, query: &str, document: &str) -> anyhow::Result<f32> {
        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();
        if query_words.is_empty() {
            return Ok(0.0);
        }
        let content_lower = document.to_lowercase();
        let matched = query_words.iter().filter(|w| content_lower.contains(*w)).count();
        #[allow(clippy::cast_precision_loss)]
        let fraction = matched as f32 / query_words.len() as f32;
        Ok(fraction)
    }
}
