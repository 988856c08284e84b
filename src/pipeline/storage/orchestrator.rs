use super::StorageError;
use super::types::{Chunker, EmbeddingModel, IndexStats, VectorStore};
use crate::pipeline::corpus::Document;

/// Builds the retrieval index from the loaded corpus:
/// chunk → embed → vector store, one document at a time.
pub struct CorpusIndexer<'a, C: Chunker, E: EmbeddingModel, V: VectorStore> {
    chunker: &'a C,
    embedder: &'a E,
    vector_store: &'a V,
}

impl<'a, C: Chunker, E: EmbeddingModel, V: VectorStore> CorpusIndexer<'a, C, E, V> {
    pub fn new(chunker: &'a C, embedder: &'a E, vector_store: &'a V) -> Self {
        Self {
            chunker,
            embedder,
            vector_store,
        }
    }

    /// Index every document. Any embedding failure aborts indexing.
    pub fn index(&self, documents: &[Document]) -> Result<IndexStats, StorageError> {
        let mut stats = IndexStats {
            dimension: self.embedder.dimension(),
            ..IndexStats::default()
        };

        for doc in documents {
            let chunks = self.chunker.chunk(&doc.text);
            if chunks.is_empty() {
                tracing::warn!(file = %doc.source_name, "Document produced no chunks");
                continue;
            }

            let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            let embeddings = match self.embedder.embed_batch(&texts) {
                Ok(embs) => embs,
                Err(e) => {
                    tracing::warn!(
                        file = %doc.source_name,
                        error = %e,
                        "Embedding batch failed, retrying chunk by chunk"
                    );
                    texts
                        .iter()
                        .map(|t| self.embedder.embed(t))
                        .collect::<Result<Vec<_>, _>>()?
                }
            };

            let stored =
                self.vector_store
                    .store_chunks(&chunks, &embeddings, &doc.id, &doc.source_name)?;

            tracing::debug!(file = %doc.source_name, chunks = stored, "Document indexed");
            stats.documents += 1;
            stats.chunks += stored;
        }

        tracing::info!(
            documents = stats.documents,
            chunks = stats.chunks,
            dimension = stats.dimension,
            "Retrieval index built"
        );
        Ok(stats)
    }
}
