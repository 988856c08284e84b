use serde::Serialize;
use uuid::Uuid;

use super::StorageError;

/// Counts reported after the corpus has been indexed.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
}

/// A passage of a reference document, the unit of retrieval.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub content: String,
    pub chunk_index: usize,
    pub section_title: Option<String>,
    pub char_offset: usize,
}

/// Chunking strategy trait
pub trait Chunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}

/// Embedding model abstraction
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError>;
    fn dimension(&self) -> usize;
}

/// Allow `Box<dyn EmbeddingModel>` to be used as `&impl EmbeddingModel`.
impl EmbeddingModel for Box<dyn EmbeddingModel + Send + Sync> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Vector store abstraction (write side).
pub trait VectorStore {
    fn store_chunks(
        &self,
        chunks: &[TextChunk],
        embeddings: &[Vec<f32>],
        document_id: &Uuid,
        source_name: &str,
    ) -> Result<usize, StorageError>;
}
