//! Structural segmentation: splits raw text into a lossless sequence of
//! plain text runs, protected blocks (tables, code fences) and delimited
//! units (slides, messages).

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use ragkit_core::{Error, Result};

static HTML_TABLE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<table\b").expect("valid table open pattern"));
static HTML_TABLE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</table\s*>").expect("valid table close pattern"));
static CODE_FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```[^\n]*").expect("valid fence open pattern"));
static CODE_FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```[ \t]*$").expect("valid fence close pattern"));
static SLIDE_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## Slide (\d+)[ \t]*$").expect("valid slide pattern"));
static EMAIL_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## Email (\d+)[ \t]*$").expect("valid email pattern"));

#[derive(Debug, Clone)]
pub enum BoundaryMarker {
    /// Line-anchored delimiter. Each match starts a unit that runs to the next
    /// match or the end of text. Capture group 1, if any, labels the unit.
    Delimiter(Regex),
    /// Protected span from an `open` match to the end of its `close` match.
    Block { open: Regex, close: Regex, nested: bool },
}

impl BoundaryMarker {
    pub fn delimiter(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Delimiter)
            .map_err(|e| Error::invalid_config(format!("invalid delimiter pattern: {e}")))
    }

    pub fn block(open: &str, close: &str, nested: bool) -> Result<Self> {
        let compile = |p: &str| {
            Regex::new(p).map_err(|e| Error::invalid_config(format!("invalid block pattern: {e}")))
        };
        Ok(Self::Block { open: compile(open)?, close: compile(close)?, nested })
    }

    pub fn html_table() -> Self {
        Self::Block { open: HTML_TABLE_OPEN.clone(), close: HTML_TABLE_CLOSE.clone(), nested: true }
    }

    pub fn code_fence() -> Self {
        Self::Block { open: CODE_FENCE_OPEN.clone(), close: CODE_FENCE_CLOSE.clone(), nested: false }
    }

    /// `## Slide N` headings from slide-deck exports.
    pub fn slide() -> Self {
        Self::Delimiter(SLIDE_DELIMITER.clone())
    }

    /// `## Email N` headings from mailbox exports.
    pub fn email() -> Self {
        Self::Delimiter(EMAIL_DELIMITER.clone())
    }

    pub fn is_delimiter(&self) -> bool {
        matches!(self, Self::Delimiter(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Block,
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicSegment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
    /// Byte offset of `text` in the segmented input.
    pub offset: usize,
    pub label: Option<&'a str>,
}

impl AtomicSegment<'_> {
    /// Block and Unit segments must not be split across chunks.
    pub fn is_protected(&self) -> bool {
        self.kind != SegmentKind::Text
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Reusable segmenter over a fixed marker set.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    markers: Vec<BoundaryMarker>,
}

impl Segmenter {
    pub fn new(markers: Vec<BoundaryMarker>) -> Self {
        Self { markers }
    }

    /// HTML tables and fenced code blocks.
    pub fn protected_blocks() -> Self {
        Self::new(vec![BoundaryMarker::html_table(), BoundaryMarker::code_fence()])
    }

    pub fn markers(&self) -> &[BoundaryMarker] {
        &self.markers
    }

    pub fn segment<'a>(&self, text: &'a str) -> Vec<AtomicSegment<'a>> {
        segment(text, &self.markers)
    }
}

struct BlockPattern<'m> {
    open: &'m Regex,
    close: &'m Regex,
    nested: bool,
}

/// Partition `text` into atomic segments. Concatenating the returned
/// segment texts reproduces `text` exactly.
pub fn segment<'a>(text: &'a str, markers: &[BoundaryMarker]) -> Vec<AtomicSegment<'a>> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut blocks = Vec::new();
    let mut units: Vec<(usize, Option<&'a str>)> = Vec::new();
    for marker in markers {
        match marker {
            BoundaryMarker::Delimiter(re) => {
                for caps in re.captures_iter(text) {
                    let Some(m) = caps.get(0) else { continue };
                    if m.start() < text.len() {
                        units.push((m.start(), caps.get(1).map(|g| g.as_str())));
                    }
                }
            }
            BoundaryMarker::Block { open, close, nested } => {
                blocks.push(BlockPattern { open, close, nested: *nested });
            }
        }
    }
    units.sort_by_key(|(start, _)| *start);
    units.dedup_by_key(|(start, _)| *start);

    let head_end = units.first().map_or(text.len(), |(start, _)| *start);
    let mut out = Vec::new();
    scan_blocks(text, head_end, &blocks, &mut out);

    for (i, &(start, label)) in units.iter().enumerate() {
        let end = units.get(i + 1).map_or(text.len(), |(next, _)| *next);
        out.push(AtomicSegment { kind: SegmentKind::Unit, text: &text[start..end], offset: start, label });
    }
    out
}

fn scan_blocks<'a>(text: &'a str, end: usize, blocks: &[BlockPattern<'_>], out: &mut Vec<AtomicSegment<'a>>) {
    let haystack = &text[..end];
    let mut pos = 0;

    while pos < end && !blocks.is_empty() {
        let next_open = blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.open.find_at(haystack, pos).map(|m| (i, m)))
            .filter(|(_, m)| !m.is_empty())
            .min_by_key(|(i, m)| (m.start(), *i));
        let Some((idx, open)) = next_open else { break };

        match find_close(haystack, open.end(), &blocks[idx]) {
            Some(close_end) => {
                push_text(text, pos, open.start(), out);
                out.push(AtomicSegment {
                    kind: SegmentKind::Block,
                    text: &text[open.start()..close_end],
                    offset: open.start(),
                    label: None,
                });
                pos = close_end;
            }
            None => {
                warn!(offset = open.start(), marker = open.as_str(), "unterminated block; treating remainder as text");
                break;
            }
        }
    }
    push_text(text, pos, end, out);
}

fn find_close(haystack: &str, from: usize, block: &BlockPattern<'_>) -> Option<usize> {
    if !block.nested {
        return block.close.find_at(haystack, from).map(|m| m.end());
    }
    let mut depth = 1usize;
    let mut cursor = from;
    loop {
        let close = block.close.find_at(haystack, cursor)?;
        match block.open.find_at(haystack, cursor) {
            Some(open) if open.start() < close.start() && !open.is_empty() => {
                depth += 1;
                cursor = open.end();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(close.end());
                }
                cursor = if close.is_empty() { next_boundary(haystack, close.end())? } else { close.end() };
            }
        }
    }
}

fn next_boundary(text: &str, at: usize) -> Option<usize> {
    text[at..].chars().next().map(|c| at + c.len_utf8())
}

fn push_text<'a>(text: &'a str, start: usize, end: usize, out: &mut Vec<AtomicSegment<'a>>) {
    if start < end {
        out.push(AtomicSegment { kind: SegmentKind::Text, text: &text[start..end], offset: start, label: None });
    }
}
