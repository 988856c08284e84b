use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::RagError;

/// A chunk with its relevance score (from vector search)
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub source_name: String,
    pub section_title: Option<String>,
    pub content: String,
    pub score: f32,
}

/// Assembled context ready for prompt
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub estimated_tokens: usize,
    pub chunks_included: Vec<ScoredChunk>,
}

/// Where a passage used for an assessment came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub source_name: String,
    pub section_title: Option<String>,
    pub score: f32,
}

/// Model output for one question/answer pair. Opaque text: never parsed
/// into risk levels, rendered as-is.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub text: String,
    pub sources: Vec<SourceRef>,
    pub model: String,
}

impl fmt::Display for AssessmentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Vector store search trait (read side of the storage `VectorStore`)
pub trait VectorSearch {
    fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, RagError>;
}

/// Answers one rendered prompt against the indexed corpus.
pub trait QueryEngine {
    fn query(&self, prompt: &str) -> Result<AssessmentResult, RagError>;
}

impl<T: QueryEngine + ?Sized> QueryEngine for &T {
    fn query(&self, prompt: &str) -> Result<AssessmentResult, RagError> {
        (**self).query(prompt)
    }
}
