use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use ragkit_core::config::{ChunkConfig, SemanticConfig};
use ragkit_core::traits::{Embedder, LengthFunction};
use ragkit_core::vector_math::cosine;
use ragkit_core::{Chunk, Error, Result};

use crate::recursive::RecursiveChunker;
use crate::sentence::{sentence_spans, trim_span, SENTENCE_TERMINALS};

/// Mean adjacent similarity above this reads as one coherent topic.
pub const LOW_COMPLEXITY_SIMILARITY: f32 = 0.7;
/// Mean adjacent similarity above this (and up to the low bound) is mixed.
pub const MEDIUM_COMPLEXITY_SIMILARITY: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticComplexity {
    Low,
    Medium,
    High,
}

impl SemanticComplexity {
    pub fn from_similarity(avg_similarity: f32) -> Self {
        if avg_similarity > LOW_COMPLEXITY_SIMILARITY {
            Self::Low
        } else if avg_similarity > MEDIUM_COMPLEXITY_SIMILARITY {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticAnalysis {
    pub sentence_count: usize,
    /// Mean cosine similarity of adjacent sentences; `None` below two sentences.
    pub avg_similarity: Option<f32>,
    pub similarity_variance: Option<f32>,
    pub complexity: SemanticComplexity,
    /// Similarity runs before size packing.
    pub recommended_chunks: usize,
}

/// Groups sentences into chunks at points where adjacent sentence
/// embeddings diverge.
pub struct SemanticChunker {
    config: ChunkConfig,
    semantic: SemanticConfig,
    embedder: Arc<dyn Embedder>,
    length: Arc<dyn LengthFunction>,
    fallback: RecursiveChunker,
}

impl SemanticChunker {
    pub fn new(config: ChunkConfig, semantic: SemanticConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        if !semantic.similarity_threshold.is_finite() {
            return Err(Error::invalid_config("semantic.similarity_threshold must be finite"));
        }
        let fallback = RecursiveChunker::new(ChunkConfig { chunk_overlap: 0, ..config.clone() })?.with_markers(Vec::new());
        let length = config.length_type.function();
        Ok(Self { config, semantic, embedder, length, fallback })
    }

    #[must_use]
    pub fn with_length_function(mut self, length: Arc<dyn LengthFunction>) -> Self {
        self.fallback = self.fallback.with_length_function(length.clone());
        self.length = length;
        self
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Sentence statistics for `text`: adjacent similarity and the number of
    /// runs [`chunk`](Self::chunk) would form before size packing. Texts with
    /// fewer than two sentences are reported as low complexity without an
    /// embedding call.
    pub fn analyze(&self, text: &str) -> Result<SemanticAnalysis> {
        let spans = Self::sentences(text);
        if spans.len() < 2 {
            return Ok(SemanticAnalysis {
                sentence_count: spans.len(),
                avg_similarity: None,
                similarity_variance: None,
                complexity: SemanticComplexity::Low,
                recommended_chunks: usize::from(!spans.is_empty()),
            });
        }

        let sentences: Vec<String> = spans.iter().map(|s| text[s.clone()].to_string()).collect();
        let lens: Vec<usize> = sentences.iter().map(|s| self.length.length(s)).collect();
        let embeddings = self.embed(&sentences)?;
        let similarities: Vec<f32> = embeddings.windows(2).map(|w| cosine(&w[0], &w[1])).collect();

        #[allow(clippy::cast_precision_loss)]
        let n = similarities.len() as f32;
        let mean = similarities.iter().sum::<f32>() / n;
        let variance = similarities.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;

        Ok(SemanticAnalysis {
            sentence_count: spans.len(),
            avg_similarity: Some(mean),
            similarity_variance: Some(variance),
            complexity: SemanticComplexity::from_similarity(mean),
            recommended_chunks: self.runs(&embeddings, &lens).len(),
        })
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        let spans = Self::sentences(text);
        if spans.is_empty() {
            return Ok(Vec::new());
        }

        let sentences: Vec<String> = spans.iter().map(|s| text[s.clone()].to_string()).collect();
        let lens: Vec<usize> = sentences.iter().map(|s| self.length.length(s)).collect();

        let runs = if spans.len() == 1 { vec![0..1] } else { self.runs(&self.embed(&sentences)?, &lens) };

        let mut groups = Vec::new();
        for run in runs {
            if self.span_len(text, &spans, run.start, run.end - 1) <= self.config.chunk_size {
                groups.push(run);
            } else {
                groups.extend(self.pack(text, &spans, run));
            }
        }

        let mut ranges = Vec::new();
        for (gi, group) in groups.iter().enumerate() {
            let body = spans[group.start].start..spans[group.end - 1].end;
            if group.len() == 1 && lens[group.start] > self.config.chunk_size {
                ranges.extend(self.fallback.split_ranges(text, body));
                continue;
            }
            let start = if gi > 0 { self.overlap_start(text, group, &spans) } else { body.start };
            ranges.push(start..body.end);
        }

        debug!(sentences = spans.len(), chunks = ranges.len(), "semantic chunking complete");
        Ok(ranges
            .into_iter()
            .map(|r| {
                let chunk = Chunk::new(&text[r.clone()]);
                if self.config.add_start_index { chunk.with_start_index(r.start) } else { chunk }
            })
            .collect())
    }

    fn sentences(text: &str) -> Vec<Range<usize>> {
        sentence_spans(text, SENTENCE_TERMINALS, false)
            .into_iter()
            .filter_map(|s| trim_span(text, s))
            .collect()
    }

    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.embedder.embed_batch(sentences)?;
        if embeddings.len() != sentences.len() {
            return Err(Error::EmbeddingCount { expected: sentences.len(), got: embeddings.len() });
        }
        Ok(embeddings)
    }

    /// Sentence index ranges split at similarity drops, honouring the
    /// minimum run length.
    fn runs(&self, embeddings: &[Vec<f32>], lens: &[usize]) -> Vec<Range<usize>> {
        let min = self.semantic.min_chunk_size;
        let mut runs = Vec::new();
        let mut start = 0;
        let mut run_len = lens[0];

        for i in 1..lens.len() {
            let similarity = cosine(&embeddings[i - 1], &embeddings[i]);
            if similarity < self.semantic.similarity_threshold && run_len >= min {
                runs.push(start..i);
                start = i;
                run_len = 0;
            }
            run_len += lens[i];
        }

        match runs.pop() {
            Some(prev) if run_len < min => runs.push(prev.start..lens.len()),
            Some(prev) => {
                runs.push(prev);
                runs.push(start..lens.len());
            }
            None => runs.push(start..lens.len()),
        }
        runs
    }

    /// Measured length of the text from sentence `first` through sentence
    /// `last`, including the whitespace between them.
    fn span_len(&self, text: &str, spans: &[Range<usize>], first: usize, last: usize) -> usize {
        self.length.length(&text[spans[first].start..spans[last].end])
    }

    /// Greedy sentence packing for runs over the ceiling.
    fn pack(&self, text: &str, spans: &[Range<usize>], run: Range<usize>) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        let mut start = run.start;
        for i in run.clone() {
            if i > start && self.span_len(text, spans, start, i) > self.config.chunk_size {
                out.push(start..i);
                start = i;
            }
        }
        out.push(start..run.end);
        out
    }

    /// Start offset including whole trailing sentences of the previous group.
    /// The carried sentences stay within `chunk_overlap` and the whole chunk
    /// within `chunk_size`.
    fn overlap_start(&self, text: &str, group: &Range<usize>, spans: &[Range<usize>]) -> usize {
        let last = group.end - 1;
        let mut first = group.start;
        while first > 0
            && self.span_len(text, spans, first - 1, group.start - 1) <= self.config.chunk_overlap
            && self.span_len(text, spans, first - 1, last) <= self.config.chunk_size
        {
            first -= 1;
        }
        spans[first].start
    }
}
