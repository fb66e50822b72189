//! ragkit-core
//!
//! Shared domain types, configuration, capability traits and errors used by
//! the chunking, lexical, vector and hybrid crates.

pub mod config;
pub mod error;
pub mod length;
pub mod traits;
pub mod types;
pub mod vector_math;

pub use error::{Error, Result};
pub use types::{Chunk, ChunkKey, Document, FusedResult, Meta, RerankedResult, ScoredCandidate};
