//! Process-wide query engine handle.
//!
//! Loading the corpus and embedding it is expensive, so the engine is built
//! at most once per process and shared read-only afterwards. A failed build
//! leaves the cell empty; the next access tries again.

use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::config::{AppConfig, EmbedderKind};
use crate::pipeline::corpus::{load_corpus, CorpusError};
use crate::pipeline::gemini::{GeminiClient, GeminiError};
use crate::pipeline::rag::gemini::GeminiRagGenerator;
use crate::pipeline::rag::orchestrator::RagQueryEngine;
use crate::pipeline::rag::types::QueryEngine;
use crate::pipeline::storage::chunker::GuidelineChunker;
use crate::pipeline::storage::embedder::GeminiEmbedder;
use crate::pipeline::storage::orchestrator::CorpusIndexer;
use crate::pipeline::storage::types::{EmbeddingModel, IndexStats};
use crate::pipeline::storage::vectordb::InMemoryVectorStore;
use crate::pipeline::storage::StorageError;

#[derive(Error, Debug)]
pub enum EngineInitError {
    #[error("Corpus loading failed: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Index build failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Model client setup failed: {0}")]
    Model(#[from] GeminiError),

    #[error("Local embeddings requested but the binary was built without the `onnx-embeddings` feature")]
    OnnxUnavailable,

}

/// The built engine plus what the health endpoint reports about it.
pub struct SharedEngine {
    pub engine: Box<dyn QueryEngine + Send + Sync>,
    pub stats: IndexStats,
    pub model: String,
}

static ENGINE: OnceCell<SharedEngine> = OnceCell::new();

/// Shared engine, building it on first access.
pub fn engine_or_init(config: &AppConfig) -> Result<&'static SharedEngine, EngineInitError> {
    ENGINE.get_or_try_init(|| build_engine(config))
}

/// Load the corpus, embed it, and wire the query engine.
pub fn build_engine(config: &AppConfig) -> Result<SharedEngine, EngineInitError> {
    tracing::info!(
        data_dir = %config.data_dir.display(),
        embedder = config.embedder.as_str(),
        model = %config.model,
        "Initialising query engine"
    );

    let documents = load_corpus(&config.data_dir, config.corpus_recursive)?;
    let embedder = build_embedder(config)?;
    let chunker = GuidelineChunker::new();
    let vector_store = InMemoryVectorStore::new();

    let stats = CorpusIndexer::new(&chunker, &embedder, &vector_store).index(&documents)?;

    let client = GeminiClient::new(&config.gemini_base_url, &config.api_key, config.timeout_secs)?;
    let generator = GeminiRagGenerator::new(client, &config.model, config.temperature);
    let engine = RagQueryEngine::new(generator, embedder, vector_store, config.top_k);

    Ok(SharedEngine {
        engine: Box::new(engine),
        stats,
        model: config.model.clone(),
    })
}

fn build_embedder(
    config: &AppConfig,
) -> Result<Box<dyn EmbeddingModel + Send + Sync>, EngineInitError> {
    match config.embedder {
        EmbedderKind::Gemini => {
            let client =
                GeminiClient::new(&config.gemini_base_url, &config.api_key, config.timeout_secs)?;
            Ok(Box::new(GeminiEmbedder::new(client, &config.embedding_model)))
        }
        #[cfg(feature = "onnx-embeddings")]
        EmbedderKind::Onnx => {
            let embedder =
                crate::pipeline::storage::embedder::OnnxEmbedder::load(&config.onnx_model_dir)?;
            Ok(Box::new(embedder))
        }
        #[cfg(not(feature = "onnx-embeddings"))]
        EmbedderKind::Onnx => Err(EngineInitError::OnnxUnavailable),
    }
}
