pub mod types;
pub mod retrieval;
pub mod context;
pub mod prompt;
pub mod gemini;
pub mod orchestrator;

use thiserror::Error;

use crate::pipeline::gemini::GeminiError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Model call failed: {0}")]
    Model(#[from] GeminiError),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Vector search failed: {0}")]
    VectorSearch(String),
}
