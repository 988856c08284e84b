use super::RagError;
use super::types::{ScoredChunk, VectorSearch};
use crate::pipeline::storage::types::EmbeddingModel;

/// Embed the query text and return the `top_k` closest passages.
pub fn semantic_search(
    query_text: &str,
    embedder: &dyn EmbeddingModel,
    vector_store: &dyn VectorSearch,
    top_k: usize,
) -> Result<Vec<ScoredChunk>, RagError> {
    let query_embedding = embedder
        .embed(query_text)
        .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;

    vector_store.search(&query_embedding, top_k)
}
