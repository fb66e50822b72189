//! ragkit-chunk
//!
//! Structure-aware text chunkers: recursive separator cascade, embedding
//! driven semantic grouping, delimiter-bounded units (slides, messages) and a
//! semantic/recursive hybrid, plus [`AutoChunker`] which picks recursive,
//! semantic or hybrid chunking per text. All of them share the [`Chunker`] trait.

pub mod auto;
pub mod boundary;
pub mod hybrid;
pub mod recursive;
pub mod redact;
pub mod segment;
pub mod semantic;
pub mod sentence;

use serde_json::Value;

use ragkit_core::{Chunk, Document, Result};

pub use auto::{AutoChunker, ChunkStrategy};
pub use boundary::{BoundaryChunker, BoundaryChunkerConfig};
pub use hybrid::HybridChunker;
pub use recursive::RecursiveChunker;
pub use redact::AddressRedactor;
pub use segment::{segment, AtomicSegment, BoundaryMarker, SegmentKind, Segmenter};
pub use semantic::{SemanticAnalysis, SemanticChunker, SemanticComplexity};

pub trait Chunker: Send + Sync {
    /// Short strategy name recorded in chunk metadata.
    fn name(&self) -> &'static str;

    fn chunk(&self, text: &str) -> Result<Vec<Chunk>>;

    /// Chunk a document and stamp each chunk with `"{doc_id}_chunk_{i}"` ids
    /// and provenance metadata. Document metadata is copied in without
    /// overwriting keys the chunker already set.
    fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunk(&document.content)?;
        let total = chunks.len();
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.id = Some(format!("{}_chunk_{i}", document.id));
            chunk.metadata.insert("source_doc_id".into(), Value::from(document.id.as_str()));
            chunk.metadata.insert("chunk_index".into(), Value::from(i));
            chunk.metadata.insert("total_chunks".into(), Value::from(total));
            chunk.metadata.insert("chunker".into(), Value::from(self.name()));
            for (key, value) in &document.metadata {
                chunk.metadata.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Ok(chunks)
    }
}

impl Chunker for RecursiveChunker {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        Ok(RecursiveChunker::chunk(self, text))
    }
}

impl Chunker for SemanticChunker {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        SemanticChunker::chunk(self, text)
    }
}

impl Chunker for BoundaryChunker {
    fn name(&self) -> &'static str {
        "boundary"
    }

    fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        Ok(BoundaryChunker::chunk(self, text))
    }
}

impl Chunker for HybridChunker {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        HybridChunker::chunk(self, text)
    }
}
