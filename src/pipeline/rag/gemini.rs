//! Adapter bridging `GeminiClient` to `LlmGenerate` (RAG pipeline).
//!
//! The client takes model and temperature per call; the pipeline does not.
//! This adapter stores both and delegates.

use super::orchestrator::LlmGenerate;
use super::RagError;
use crate::pipeline::gemini::GeminiClient;

/// RAG-compatible generator backed by the hosted Gemini API.
pub struct GeminiRagGenerator {
    client: GeminiClient,
    model: String,
    temperature: f32,
}

impl GeminiRagGenerator {
    pub fn new(client: GeminiClient, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

impl LlmGenerate for GeminiRagGenerator {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError> {
        Ok(self
            .client
            .generate(&self.model, system, prompt, self.temperature)?)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::gemini::GeminiError;

    #[test]
    fn reports_configured_model() {
        let client = GeminiClient::new("http://127.0.0.1:9", "test-key", 1).unwrap();
        let generator = GeminiRagGenerator::new(client, "gemini-1.5-flash", 0.3);
        assert_eq!(generator.model(), "gemini-1.5-flash");
    }

    #[test]
    fn transport_failure_maps_to_model_error() {
        let client = GeminiClient::new("http://127.0.0.1:9", "test-key", 1).unwrap();
        let generator = GeminiRagGenerator::new(client, "gemini-1.5-flash", 0.3);
        let err = generator.generate("system", "prompt").unwrap_err();
        assert!(matches!(
            err,
            RagError::Model(
                GeminiError::Connection(_) | GeminiError::Timeout(_) | GeminiError::HttpClient(_)
            )
        ));
    }
}
