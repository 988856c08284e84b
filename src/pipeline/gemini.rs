//! Blocking HTTP client for the hosted Gemini API.
//!
//! Two endpoints are used:
//! - `models/{model}:generateContent` for the triage assessment
//! - `models/{model}:batchEmbedContents` / `:embedContent` for retrieval
//!
//! The API key is sent in the `x-goog-api-key` header, never in the URL.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum requests accepted by a single `batchEmbedContents` call.
pub const MAX_EMBED_BATCH: usize = 100;

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Cannot reach Gemini API at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Gemini rejected the API key")]
    AuthFailed,

    #[error("Gemini rate limit exceeded")]
    RateLimited,

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// Gemini API client shared by generation and embedding.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, GeminiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GeminiError::HttpClient(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        })
    }

    fn endpoint_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, GeminiError>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GeminiError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    GeminiError::Timeout(self.timeout_secs)
                } else {
                    GeminiError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(map_http_error(status.as_u16(), body));
        }

        response
            .json()
            .map_err(|e| GeminiError::ResponseParsing(e.to_string()))
    }

    /// Single-turn text generation. Returns the concatenated text parts
    /// of the first candidate.
    pub fn generate(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GeminiError> {
        let url = self.endpoint_url(model, "generateContent");
        let body = GenerateRequest::new(system, prompt, temperature);
        let parsed: GenerateResponse = self.post_json(&url, &body)?;
        parsed.into_text()
    }

    /// Embed one text.
    pub fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, GeminiError> {
        let url = self.endpoint_url(model, "embedContent");
        let body = EmbedRequest::new(model, text);
        let parsed: EmbedResponse = self.post_json(&url, &body)?;
        Ok(parsed.embedding.values)
    }

    /// Embed many texts, split into API-sized batches. Output order
    /// matches input order.
    pub fn embed_batch(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, GeminiError> {
        let url = self.endpoint_url(model, "batchEmbedContents");
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_EMBED_BATCH) {
            let body = BatchEmbedRequest {
                requests: batch.iter().map(|t| EmbedRequest::new(model, *t)).collect(),
            };
            let parsed: BatchEmbedResponse = self.post_json(&url, &body)?;
            if parsed.embeddings.len() != batch.len() {
                return Err(GeminiError::ResponseParsing(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    parsed.embeddings.len()
                )));
            }
            vectors.extend(parsed.embeddings.into_iter().map(|e| e.values));
        }

        Ok(vectors)
    }
}

fn map_http_error(status: u16, body: String) -> GeminiError {
    match status {
        401 | 403 => GeminiError::AuthFailed,
        429 => GeminiError::RateLimited,
        _ => GeminiError::Api { status, body },
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateRequest<'a> {
    fn new(system: &'a str, prompt: &'a str, temperature: f32) -> Self {
        Self {
            system_instruction: (!system.is_empty()).then(|| Content::text(None, system)),
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: GenerationConfig { temperature },
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn text(role: Option<&'static str>, text: &'a str) -> Self {
        Self {
            role,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, GeminiError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GeminiError::ResponseParsing("no candidates in response".into()))?;

        let content = candidate.content.ok_or_else(|| {
            GeminiError::ResponseParsing(format!(
                "candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        Ok(content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
}

impl<'a> EmbedRequest<'a> {
    fn new(model: &str, text: &'a str) -> Self {
        Self {
            model: format!("models/{model}"),
            content: Content::text(None, text),
        }
    }
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_trims_trailing_slash() {
        let client = GeminiClient::new("https://example.test/v1beta/", "k", 30).unwrap();
        assert_eq!(client.base_url, "https://example.test/v1beta");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn endpoint_url_has_no_key() {
        let client = GeminiClient::new("https://example.test/v1beta", "secret-key", 30).unwrap();
        let url = client.endpoint_url("gemini-1.5-flash", "generateContent");
        assert_eq!(
            url,
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!url.contains("secret-key"));
    }

    #[test]
    fn generate_request_shape() {
        let body = serde_json::to_value(GenerateRequest::new("be brief", "hello", 0.3)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
    }

    #[test]
    fn generate_request_omits_empty_system() {
        let body = serde_json::to_value(GenerateRequest::new("", "hello", 0.3)).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn response_text_parts_are_joined() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "- Risk Level: High\n"}, {"text": "- Reasoning: ..."}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(parsed.into_text().unwrap(), "- Risk Level: High\n- Reasoning: ...");
    }

    #[test]
    fn response_without_candidates_is_error() {
        let parsed: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(parsed.into_text(), Err(GeminiError::ResponseParsing(_))));
    }

    #[test]
    fn blocked_candidate_reports_finish_reason() {
        let parsed: GenerateResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        let err = parsed.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn embed_request_prefixes_model() {
        let body = serde_json::to_value(EmbedRequest::new("text-embedding-004", "chunk")).unwrap();
        assert_eq!(body["model"], "models/text-embedding-004");
        assert_eq!(body["content"]["parts"][0]["text"], "chunk");
    }

    #[test]
    fn batch_embed_response_parses() {
        let parsed: BatchEmbedResponse = serde_json::from_value(json!({
            "embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]
        }))
        .unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn http_error_mapping() {
        assert!(matches!(map_http_error(401, String::new()), GeminiError::AuthFailed));
        assert!(matches!(map_http_error(403, String::new()), GeminiError::AuthFailed));
        assert!(matches!(map_http_error(429, String::new()), GeminiError::RateLimited));
        match map_http_error(500, "boom".into()) {
            GeminiError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unreachable_host_is_connection_error() {
        let client = GeminiClient::new("http://127.0.0.1:9", "k", 2).unwrap();
        let err = client.generate("m", "", "hi", 0.3).unwrap_err();
        assert!(matches!(
            err,
            GeminiError::Connection(_) | GeminiError::HttpClient(_) | GeminiError::Timeout(_)
        ));
    }
}
