//! Sentence and word span detection plus greedy span packing.
//!
//! Spans are byte ranges into the original text, so packed groups are always
//! real substrings and keep their offsets.

use std::ops::Range;

use ragkit_core::length::is_cjk;
use ragkit_core::traits::LengthFunction;

/// Terminal punctuation used for semantic sentence splitting.
pub const SENTENCE_TERMINALS: &[char] = &['。', '！', '？', '.', '!', '?'];

/// Terminals used when splitting oversized slides/messages; clause
/// separators count as well.
pub const UNIT_TERMINALS: &[char] = &['。', '！', '？', '；', '.', '!', '?', ';'];

/// Split `text` after every run of `terminals` that is followed by
/// whitespace, the end of text, an uppercase letter or a CJK character.
/// When `break_on_newline` is set every newline also ends a span.
///
/// The returned spans partition `text`. Whitespace after a boundary starts
/// the next span; use [`trim_span`] to drop it.
pub fn sentence_spans(text: &str, terminals: &[char], break_on_newline: bool) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let cut = if break_on_newline && c == '\n' {
            Some(i + 1)
        } else if terminals.contains(&c) {
            let mut end = i + c.len_utf8();
            while let Some(&(j, d)) = chars.peek() {
                if !terminals.contains(&d) {
                    break;
                }
                end = j + d.len_utf8();
                chars.next();
            }
            match chars.peek() {
                None => Some(end),
                Some(&(_, n)) if n.is_whitespace() || n.is_uppercase() || is_cjk(n) => Some(end),
                Some(_) => None,
            }
        } else {
            None
        };

        if let Some(cut) = cut {
            if cut > start {
                spans.push(start..cut);
            }
            start = cut;
        }
    }
    if start < text.len() {
        spans.push(start..text.len());
    }
    spans
}

/// Whitespace-delimited word spans.
pub fn word_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(s..text.len());
    }
    spans
}

pub fn char_spans(text: &str) -> Vec<Range<usize>> {
    text.char_indices().map(|(i, c)| i..i + c.len_utf8()).collect()
}

/// Shrink `span` to exclude surrounding whitespace. `None` if nothing remains.
pub fn trim_span(text: &str, span: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[span.clone()];
    let trimmed = slice.trim_start();
    let start = span.start + (slice.len() - trimmed.len());
    let end = start + trimmed.trim_end().len();
    (start < end).then_some(start..end)
}

/// Greedily pack consecutive spans into groups whose measured length,
/// including the text between spans, stays within `max_len`. A span that is
/// itself longer than `max_len` forms a group of its own; callers decide how
/// to split it further.
pub fn pack_spans(
    text: &str,
    spans: &[Range<usize>],
    max_len: usize,
    length: &dyn LengthFunction,
) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut current: Option<Range<usize>> = None;

    for span in spans {
        current = match current.take() {
            None => Some(span.clone()),
            Some(group) if length.length(&text[group.start..span.end]) <= max_len => Some(group.start..span.end),
            Some(group) => {
                groups.push(group);
                Some(span.clone())
            }
        };
    }
    if let Some(group) = current {
        groups.push(group);
    }
    groups
}

/// Split an oversized span by words, then by characters for words that are
/// still too long, packing greedily at each level.
pub fn split_by_words(
    text: &str,
    span: Range<usize>,
    max_len: usize,
    length: &dyn LengthFunction,
) -> Vec<Range<usize>> {
    let shift = |r: Range<usize>| r.start + span.start..r.end + span.start;
    let words: Vec<_> = word_spans(&text[span.clone()]).into_iter().map(shift).collect();

    let mut out = Vec::new();
    for group in pack_spans(text, &words, max_len, length) {
        if length.length(&text[group.clone()]) <= max_len {
            out.push(group);
            continue;
        }
        let chars: Vec<_> = char_spans(&text[group.clone()])
            .into_iter()
            .map(|r| r.start + group.start..r.end + group.start)
            .collect();
        out.extend(pack_spans(text, &chars, max_len, length));
    }
    out
}
