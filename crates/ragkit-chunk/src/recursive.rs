use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, warn};

use ragkit_core::config::ChunkConfig;
use ragkit_core::traits::LengthFunction;
use ragkit_core::{Chunk, Result};

use crate::segment::{BoundaryMarker, Segmenter};

/// Separator-cascade chunker with greedy merging and overlap.
///
/// HTML tables and fenced code blocks are cut out first and emitted as
/// chunks of their own; the text between them is split on the first
/// configured separator it contains, recursing with the next separator for
/// pieces that are still too long, and merged back up to `chunk_size`.
#[derive(Clone)]
pub struct RecursiveChunker {
    config: ChunkConfig,
    separators: Vec<String>,
    length: Arc<dyn LengthFunction>,
    segmenter: Segmenter,
}

impl std::fmt::Debug for RecursiveChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveChunker")
            .field("config", &self.config)
            .field("separators", &self.separators)
            .finish_non_exhaustive()
    }
}

impl RecursiveChunker {
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        let mut separators = Vec::with_capacity(config.separators.len() + 1);
        for sep in &config.separators {
            separators.push(sep.clone());
            if sep.is_empty() {
                break;
            }
        }
        if separators.last().map_or(true, |s| !s.is_empty()) {
            separators.push(String::new());
        }
        let length = config.length_type.function();
        Ok(Self { config, separators, length, segmenter: Segmenter::protected_blocks() })
    }

    /// Measure chunks with a custom function (e.g. a model tokenizer).
    #[must_use]
    pub fn with_length_function(mut self, length: Arc<dyn LengthFunction>) -> Self {
        self.length = length;
        self
    }

    /// Replace the protected-segment markers. An empty list disables protection.
    #[must_use]
    pub fn with_markers(mut self, markers: Vec<BoundaryMarker>) -> Self {
        self.segmenter = Segmenter::new(markers);
        self
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut ranges = Vec::new();
        for seg in self.segmenter.segment(text) {
            if seg.is_protected() {
                let span = if self.config.strip_whitespace {
                    crate::sentence::trim_span(text, seg.offset..seg.end())
                } else {
                    Some(seg.offset..seg.end())
                };
                let Some(span) = span else { continue };
                let len = self.length.length(&text[span.clone()]);
                if len > self.config.chunk_size {
                    warn!(offset = span.start, len, chunk_size = self.config.chunk_size, "oversized protected segment emitted whole");
                }
                ranges.push(span);
            } else {
                self.split_range(text, seg.offset..seg.end(), &self.separators, &mut ranges);
            }
        }

        debug!(chunks = ranges.len(), bytes = text.len(), "recursive chunking complete");
        ranges
            .into_iter()
            .map(|r| {
                let chunk = Chunk::new(&text[r.clone()]);
                if self.config.add_start_index { chunk.with_start_index(r.start) } else { chunk }
            })
            .collect()
    }

    /// Chunk text without structural protection, returning the raw pieces.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut ranges = Vec::new();
        self.split_range(text, 0..text.len(), &self.separators, &mut ranges);
        ranges.into_iter().map(|r| text[r].to_string()).collect()
    }

    pub(crate) fn split_ranges(&self, text: &str, span: Range<usize>) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        self.split_range(text, span, &self.separators, &mut ranges);
        ranges
    }

    fn split_range(&self, text: &str, span: Range<usize>, separators: &[String], out: &mut Vec<Range<usize>>) {
        let slice = &text[span.clone()];
        let mut separator = "";
        let mut rest: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                break;
            }
            if slice.contains(sep.as_str()) {
                separator = sep;
                rest = &separators[i + 1..];
                break;
            }
        }

        let mut good = Vec::new();
        for piece in self.split_on(text, span, separator) {
            if self.length.length(&text[piece.clone()]) < self.config.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                self.merge(text, &good, out);
                good.clear();
            }
            if separator.is_empty() || rest.is_empty() {
                self.emit(text, piece, out);
            } else {
                self.split_range(text, piece, rest, out);
            }
        }
        if !good.is_empty() {
            self.merge(text, &good, out);
        }
    }

    fn split_on(&self, text: &str, span: Range<usize>, separator: &str) -> Vec<Range<usize>> {
        let base = span.start;
        let slice = &text[span];
        if separator.is_empty() {
            return crate::sentence::char_spans(slice)
                .into_iter()
                .map(|r| r.start + base..r.end + base)
                .collect();
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        for (idx, sep) in slice.match_indices(separator) {
            let end = if self.config.keep_separator { idx + sep.len() } else { idx };
            if end > start {
                pieces.push(start + base..end + base);
            }
            start = idx + sep.len();
        }
        if start < slice.len() {
            pieces.push(start + base..slice.len() + base);
        }
        pieces
    }

    /// Greedy merge up to `chunk_size`. Candidates are measured as the real
    /// joined span, so non-additive length functions still respect the bound.
    fn merge(&self, text: &str, pieces: &[Range<usize>], out: &mut Vec<Range<usize>>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut current: VecDeque<Range<usize>> = VecDeque::new();

        for range in pieces {
            if let (Some(first), Some(last)) = (current.front(), current.back()) {
                if self.span_len(text, first.start..range.end) > size {
                    self.emit(text, first.start..last.end, out);
                    while let (Some(first), Some(last)) = (current.front(), current.back()) {
                        let carried = self.span_len(text, first.start..last.end);
                        if carried <= overlap && self.span_len(text, first.start..range.end) <= size {
                            break;
                        }
                        current.pop_front();
                    }
                }
            }
            current.push_back(range.clone());
        }

        if let (Some(first), Some(last)) = (current.front(), current.back()) {
            self.emit(text, first.start..last.end, out);
        }
    }

    fn span_len(&self, text: &str, range: Range<usize>) -> usize {
        self.length.length(&text[range])
    }

    fn emit(&self, text: &str, range: Range<usize>, out: &mut Vec<Range<usize>>) {
        let range = if self.config.strip_whitespace {
            match crate::sentence::trim_span(text, range) {
                Some(r) => r,
                None => return,
            }
        } else if range.is_empty() {
            return;
        } else {
            range
        };
        out.push(range);
    }
}
