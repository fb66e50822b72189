use std::path::Path;

use anyhow::{anyhow, Result};
use tokenizers::Tokenizer;
use tracing::{debug, warn};

use ragkit_core::length::EstimatedTokens;
use ragkit_core::traits::LengthFunction;

/// Counts tokens with a HuggingFace tokenizer, without special tokens.
/// Falls back to [`EstimatedTokens`] if encoding fails.
pub struct TokenizerLength {
    tokenizer: Tokenizer,
}

impl TokenizerLength {
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
        debug!(path = %path.display(), "tokenizer loaded");
        Ok(Self { tokenizer })
    }

    pub fn from_tokenizer(tokenizer: Tokenizer) -> Self { Self { tokenizer } }
}

impl LengthFunction for TokenizerLength {
    fn length(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(enc) => enc.get_ids().len(),
            Err(e) => {
                warn!(error = %e, "tokenization failed; using estimate");
                EstimatedTokens.length(text)
            }
        }
    }
}
