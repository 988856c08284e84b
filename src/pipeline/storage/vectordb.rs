use std::sync::RwLock;

use uuid::Uuid;

use super::StorageError;
use super::types::{TextChunk, VectorStore};
use crate::pipeline::rag::types::{ScoredChunk, VectorSearch};
use crate::pipeline::rag::RagError;

/// In-memory vector index, filled once at startup and searched by cosine
/// similarity afterwards.
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<StoredChunk>>,
}

#[derive(Debug, Clone)]
struct StoredChunk {
    id: Uuid,
    document_id: Uuid,
    source_name: String,
    section_title: Option<String>,
    content: String,
    embedding: Vec<f32>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn count_for_document(&self, document_id: &Uuid) -> usize {
        self.entries
            .read()
            .map(|e| e.iter().filter(|c| c.document_id == *document_id).count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore for InMemoryVectorStore {
    fn store_chunks(
        &self,
        chunks: &[TextChunk],
        embeddings: &[Vec<f32>],
        document_id: &Uuid,
        source_name: &str,
    ) -> Result<usize, StorageError> {
        if chunks.len() != embeddings.len() {
            return Err(StorageError::VectorDb(
                "Chunk count does not match embedding count".into(),
            ));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::VectorDb("index lock poisoned".into()))?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            entries.push(StoredChunk {
                id: Uuid::new_v4(),
                document_id: *document_id,
                source_name: source_name.to_string(),
                section_title: chunk.section_title.clone(),
                content: chunk.content.clone(),
                embedding: embedding.clone(),
            });
        }

        Ok(chunks.len())
    }
}

impl VectorSearch for InMemoryVectorStore {
    fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RagError::VectorSearch("index lock poisoned".into()))?;

        let mut scored: Vec<(f32, &StoredChunk)> = entries
            .iter()
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| ScoredChunk {
                chunk_id: entry.id,
                document_id: entry.document_id,
                source_name: entry.source_name.clone(),
                section_title: entry.section_title.clone(),
                content: entry.content.clone(),
                score,
            })
            .collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
