//! Length measurement for chunk budgets.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::traits::LengthFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthType {
    #[default]
    Char,
    Token,
}

impl LengthType {
    /// Built-in length function for this unit. `Token` uses [`EstimatedTokens`];
    /// plug a model tokenizer in through the chunker builders when exact counts matter.
    pub fn function(self) -> Arc<dyn LengthFunction> {
        match self {
            Self::Char => Arc::new(CharLength),
            Self::Token => Arc::new(EstimatedTokens),
        }
    }
}

impl FromStr for LengthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "char" | "chars" | "character" => Ok(Self::Char),
            "token" | "tokens" => Ok(Self::Token),
            other => Err(Error::invalid_config(format!(
                "unsupported length_type '{other}', expected 'char' or 'token'"
            ))),
        }
    }
}

impl fmt::Display for LengthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char => f.write_str("char"),
            Self::Token => f.write_str("token"),
        }
    }
}

/// Counts Unicode scalar values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharLength;

impl LengthFunction for CharLength {
    fn length(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Model-free token estimate: one token per CJK character plus 1.3 tokens
/// per whitespace-delimited word of other scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTokens;

impl LengthFunction for EstimatedTokens {
    fn length(&self, text: &str) -> usize {
        let cjk = text.chars().filter(|c| is_cjk(*c)).count();
        let words = text
            .split_whitespace()
            .filter(|w| w.chars().any(|c| !is_cjk(c)))
            .count();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let word_tokens = (words as f32 * 1.3) as usize;
        cjk + word_tokens
    }
}

/// Logographic and syllabic East Asian scripts that carry no word spacing.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
        | '\u{3400}'..='\u{4DBF}' // extension A
        | '\u{F900}'..='\u{FAFF}' // compatibility ideographs
        | '\u{3040}'..='\u{309F}' // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{AC00}'..='\u{D7AF}' // hangul syllables
        | '\u{20000}'..='\u{2A6DF}'
    )
}
