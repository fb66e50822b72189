use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedder returned {got} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, got: usize },

    #[error("Rerank function returned a non-finite score for candidate {0}")]
    NonFiniteScore(usize),

    #[error("Index operation failed: {0}")]
    Index(String),

    /// Failure raised by an injected collaborator (embedder, scorer). Passed
    /// through untouched.
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
