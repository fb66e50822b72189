use std::borrow::Cow;
use std::ops::Range;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use ragkit_core::config::BoundarySettings;
use ragkit_core::length::LengthType;
use ragkit_core::traits::LengthFunction;
use ragkit_core::{Chunk, Error, Meta, Result};

use crate::redact::AddressRedactor;
use crate::segment::{segment, BoundaryMarker, SegmentKind};
use crate::sentence::{pack_spans, sentence_spans, split_by_words, trim_span, UNIT_TERMINALS};

#[derive(Debug, Clone)]
pub struct BoundaryChunkerConfig {
    pub delimiter: BoundaryMarker,
    pub chunk_size: usize,
    pub length_type: LengthType,
    pub redact_addresses: bool,
    pub merge_small_units: bool,
    /// Accepted for interface parity with the other chunkers; never applied.
    pub chunk_overlap: usize,
}

impl BoundaryChunkerConfig {
    pub fn new(delimiter: BoundaryMarker, chunk_size: usize, length_type: LengthType) -> Self {
        Self {
            delimiter,
            chunk_size,
            length_type,
            redact_addresses: false,
            merge_small_units: false,
            chunk_overlap: 0,
        }
    }

    /// One unit per `## Slide N` section.
    pub fn slides(chunk_size: usize, length_type: LengthType) -> Self {
        Self::new(BoundaryMarker::slide(), chunk_size, length_type)
    }

    /// One unit per `## Email N` section, with address redaction.
    pub fn emails(chunk_size: usize, length_type: LengthType) -> Self {
        Self { redact_addresses: true, ..Self::new(BoundaryMarker::email(), chunk_size, length_type) }
    }

    pub fn from_settings(settings: &BoundarySettings, delimiter: BoundaryMarker) -> Self {
        Self {
            redact_addresses: settings.redact_addresses,
            merge_small_units: settings.merge_small_units,
            ..Self::new(delimiter, settings.chunk_size, settings.length_type)
        }
    }
}

/// Chunker for documents made of delimited units (slides, messages).
///
/// Units are kept whole when they fit; oversized units are split inside
/// with tables intact. Chunks never overlap.
pub struct BoundaryChunker {
    config: BoundaryChunkerConfig,
    length: Arc<dyn LengthFunction>,
    table: BoundaryMarker,
}

struct Piece {
    range: Range<usize>,
    atomic: bool,
}

impl BoundaryChunker {
    pub fn new(config: BoundaryChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::invalid_config("chunk_size must be greater than 0"));
        }
        if !config.delimiter.is_delimiter() {
            return Err(Error::invalid_config("boundary chunker requires a delimiter marker"));
        }
        if config.chunk_overlap > 0 {
            debug!(chunk_overlap = config.chunk_overlap, "boundary chunker ignores chunk_overlap");
        }
        let length = config.length_type.function();
        Ok(Self { config, length, table: BoundaryMarker::html_table() })
    }

    #[must_use]
    pub fn with_length_function(mut self, length: Arc<dyn LengthFunction>) -> Self {
        self.length = length;
        self
    }

    pub fn config(&self) -> &BoundaryChunkerConfig {
        &self.config
    }

    /// `start_index` refers to the text after redaction when it is enabled.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let redacted: Cow<'_, str> =
            if self.config.redact_addresses { AddressRedactor.redact(text) } else { Cow::Borrowed(text) };
        let text: &str = &redacted;

        let mut emitted: Vec<(Range<usize>, Option<&str>, bool)> = Vec::new();
        for (unit, label) in self.units(text) {
            let Some(unit) = trim_span(text, unit) else { continue };
            let len = self.length.length(&text[unit.clone()]);

            if len <= self.config.chunk_size {
                if self.config.merge_small_units {
                    if let Some((prev, prev_label, true)) = emitted.last_mut() {
                        let merged = prev.start..unit.end;
                        if self.length.length(&text[merged.clone()]) <= self.config.chunk_size {
                            *prev = merged;
                            if prev_label.is_none() {
                                *prev_label = label;
                            }
                            continue;
                        }
                    }
                }
                emitted.push((unit, label, true));
            } else {
                for part in self.split_unit(text, unit) {
                    emitted.push((part, label, false));
                }
            }
        }

        debug!(chunks = emitted.len(), "boundary chunking complete");
        emitted
            .into_iter()
            .map(|(range, label, _)| {
                let mut metadata = Meta::new();
                if let Some(label) = label {
                    let value = label.parse::<u64>().map_or_else(|_| Value::from(label), Value::from);
                    metadata.insert("unit".to_string(), value);
                }
                Chunk::new(&text[range.clone()]).with_metadata(metadata).with_start_index(range.start)
            })
            .collect()
    }

    /// Header (text before the first delimiter) plus one entry per delimited unit.
    fn units<'a>(&self, text: &'a str) -> Vec<(Range<usize>, Option<&'a str>)> {
        let mut units = Vec::new();
        let mut header: Option<Range<usize>> = None;
        for seg in segment(text, std::slice::from_ref(&self.config.delimiter)) {
            if seg.kind == SegmentKind::Unit {
                units.push((seg.offset..seg.end(), seg.label));
            } else {
                header = Some(header.map_or(seg.offset..seg.end(), |h| h.start..seg.end()));
            }
        }
        if let Some(header) = header {
            units.insert(0, (header, None));
        }
        units
    }

    fn split_unit(&self, text: &str, unit: Range<usize>) -> Vec<Range<usize>> {
        let size = self.config.chunk_size;
        let length = self.length.as_ref();

        let mut pieces = Vec::new();
        for seg in segment(&text[unit.clone()], std::slice::from_ref(&self.table)) {
            let base = unit.start + seg.offset;
            if seg.kind == SegmentKind::Block {
                pieces.push(Piece { range: base..base + seg.text.len(), atomic: true });
                continue;
            }
            for span in sentence_spans(seg.text, UNIT_TERMINALS, true) {
                if let Some(span) = trim_span(text, span.start + base..span.end + base) {
                    pieces.push(Piece { range: span, atomic: false });
                }
            }
        }

        let mut out = Vec::new();
        let mut pending: Vec<Range<usize>> = Vec::new();
        for piece in pieces {
            let len = length.length(&text[piece.range.clone()]);
            if len <= size {
                pending.push(piece.range);
                continue;
            }
            out.extend(pack_spans(text, &pending, size, length));
            pending.clear();
            if piece.atomic {
                warn!(offset = piece.range.start, len, chunk_size = size, "oversized table emitted whole");
                out.push(piece.range);
            } else {
                out.extend(split_by_words(text, piece.range, size, length));
            }
        }
        out.extend(pack_spans(text, &pending, size, length));
        out
    }
}
