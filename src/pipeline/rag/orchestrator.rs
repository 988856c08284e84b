use super::context::assemble_context;
use super::prompt::{build_qa_prompt, QA_SYSTEM_PROMPT};
use super::retrieval::semantic_search;
use super::types::{AssessmentResult, QueryEngine, SourceRef, VectorSearch};
use super::RagError;
use crate::pipeline::storage::types::EmbeddingModel;

/// Trait for LLM text generation within the RAG pipeline.
pub trait LlmGenerate {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError>;

    /// Model identifier reported alongside each result.
    fn model(&self) -> &str;
}

impl<T: LlmGenerate + ?Sized> LlmGenerate for &T {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError> {
        (**self).generate(system, prompt)
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

/// Retrieval-augmented query engine.
///
/// Coordinates: retrieve → assemble → wrap in QA template → generate.
/// One model call per query; nothing is cached between queries.
pub struct RagQueryEngine<G: LlmGenerate, E: EmbeddingModel, V: VectorSearch> {
    generator: G,
    embedder: E,
    vector_store: V,
    top_k: usize,
}

impl<G: LlmGenerate, E: EmbeddingModel, V: VectorSearch> RagQueryEngine<G, E, V> {
    pub fn new(generator: G, embedder: E, vector_store: V, top_k: usize) -> Self {
        Self {
            generator,
            embedder,
            vector_store,
            top_k,
        }
    }
}

impl<G: LlmGenerate, E: EmbeddingModel, V: VectorSearch> QueryEngine for RagQueryEngine<G, E, V> {
    fn query(&self, prompt: &str) -> Result<AssessmentResult, RagError> {
        // Step 1: Retrieve passages similar to the full rendered prompt
        let chunks = semantic_search(prompt, &self.embedder, &self.vector_store, self.top_k)?;

        // Step 2: Assemble context within token budget
        let assembled = assemble_context(&chunks);
        if assembled.chunks_included.is_empty() {
            tracing::warn!("No reference passages retrieved, querying with empty context");
        }

        // Step 3: Wrap in QA template
        let qa_prompt = build_qa_prompt(&assembled.text, prompt);

        // Step 4: Generate
        let text = self.generator.generate(QA_SYSTEM_PROMPT, &qa_prompt)?;

        tracing::info!(
            model = self.generator.model(),
            passages = assembled.chunks_included.len(),
            context_tokens = assembled.estimated_tokens,
            response_chars = text.len(),
            "Assessment generated"
        );

        let sources = assembled
            .chunks_included
            .iter()
            .map(|c| SourceRef {
                source_name: c.source_name.clone(),
                section_title: c.section_title.clone(),
                score: c.score,
            })
            .collect();

        Ok(AssessmentResult {
            text,
            sources,
            model: self.generator.model().to_string(),
        })
    }
}
