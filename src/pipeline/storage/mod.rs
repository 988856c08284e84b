pub mod types;
pub mod chunker;
pub mod embedder;
pub mod vectordb;
pub mod orchestrator;

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::gemini::GeminiError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Vector DB error: {0}")]
    VectorDb(String),

    #[error("Embedding model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Embedding model initialization: {0}")]
    ModelInit(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Hosted embedding request failed: {0}")]
    HostedEmbedding(#[from] GeminiError),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
