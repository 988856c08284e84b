use super::StorageError;
use super::types::EmbeddingModel;
use crate::pipeline::gemini::GeminiClient;

/// Output dimension of all-MiniLM-L6-v2
pub const MINILM_DIM: usize = 384;

/// Output dimension of Gemini `text-embedding-004`
pub const GEMINI_EMBEDDING_DIM: usize = 768;

// ═══════════════════════════════════════════════════════════
// Hosted embeddings (default)
// ═══════════════════════════════════════════════════════════

/// Embedding model served by the Gemini API.
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
    dimension: usize,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimension: GEMINI_EMBEDDING_DIM,
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), StorageError> {
        if vector.len() != self.dimension {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl EmbeddingModel for GeminiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        let vector = self.client.embed(&self.model, text)?;
        self.check_dimension(&vector)?;
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
        let vectors = self.client.embed_batch(&self.model, texts)?;
        for v in &vectors {
            self.check_dimension(v)?;
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ═══════════════════════════════════════════════════════════
// Local all-MiniLM-L6-v2 — behind `onnx-embeddings` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-embeddings")]
mod onnx {
    use super::{EmbeddingModel, StorageError, MINILM_DIM};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Longest token sequence fed to the model; longer chunks are truncated.
    const MAX_SEQUENCE_TOKENS: usize = 256;

    /// all-MiniLM-L6-v2 through ONNX Runtime.
    ///
    /// The model directory must contain `model.onnx` and `tokenizer.json`.
    /// `Session::run` needs `&mut self`, hence the Mutex.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
    }

    impl OnnxEmbedder {
        pub fn load(model_dir: &Path) -> Result<Self, StorageError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(StorageError::ModelNotFound(model_path));
            }
            if !tokenizer_path.exists() {
                return Err(StorageError::ModelNotFound(tokenizer_path));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| StorageError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| StorageError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| StorageError::ModelInit(format!("ONNX load failed: {e}")))?;

            let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| StorageError::ModelInit(format!("Tokenizer load failed: {e}")))?;
            tokenizer
                .with_truncation(Some(tokenizers::TruncationParams {
                    max_length: MAX_SEQUENCE_TOKENS,
                    ..Default::default()
                }))
                .map_err(|e| StorageError::ModelInit(format!("Tokenizer truncation: {e}")))?;

            tracing::info!(dir = %model_dir.display(), "ONNX embedder loaded");

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        /// Mean-pooled, L2-normalized sentence embedding.
        fn infer(&self, text: &str) -> Result<Vec<f32>, StorageError> {
            use ort::value::TensorRef;

            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| StorageError::Tokenization(e.to_string()))?;

            let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
            let seq_len = input_ids.len();

            let to_array = |v: Vec<i64>| {
                ndarray::Array2::from_shape_vec((1, seq_len), v)
                    .map_err(|e| StorageError::Embedding(e.to_string()))
            };
            let ids_array = to_array(input_ids)?;
            let mask_array = to_array(attention_mask.clone())?;
            let type_array = to_array(token_type_ids)?;

            let ids_tensor = TensorRef::from_array_view(&ids_array)
                .map_err(|e| StorageError::Embedding(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask_array)
                .map_err(|e| StorageError::Embedding(e.to_string()))?;
            let type_tensor = TensorRef::from_array_view(&type_array)
                .map_err(|e| StorageError::Embedding(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| StorageError::Embedding("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| StorageError::Embedding(format!("ONNX inference failed: {e}")))?;

            let (shape, output) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| StorageError::Embedding(format!("Output extraction: {e}")))?;

            if shape.len() != 3 || shape[2] as usize != MINILM_DIM {
                return Err(StorageError::Embedding(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {seq_len}, {MINILM_DIM}]"
                )));
            }

            let mut pooled = vec![0.0f32; MINILM_DIM];
            let mut mask_sum = 0.0f32;
            for (token_idx, &mask) in attention_mask.iter().enumerate() {
                let weight = mask as f32;
                mask_sum += weight;
                let row = &output[token_idx * MINILM_DIM..(token_idx + 1) * MINILM_DIM];
                for (p, v) in pooled.iter_mut().zip(row) {
                    *p += v * weight;
                }
            }
            if mask_sum > 0.0 {
                pooled.iter_mut().for_each(|v| *v /= mask_sum);
            }

            Ok(super::l2_normalize(pooled))
        }
    }

    impl EmbeddingModel for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
            self.infer(text)
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
            texts.iter().map(|t| self.infer(t)).collect()
        }

        fn dimension(&self) -> usize {
            MINILM_DIM
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use onnx::OnnxEmbedder;

#[cfg(any(test, feature = "onnx-embeddings"))]
fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

/// Deterministic embedder for tests — hashes bytes into a unit vector.
#[cfg(test)]
pub struct MockEmbedder {
    dimension: usize,
}

#[cfg(test)]
impl MockEmbedder {
    pub fn new() -> Self {
        Self { dimension: MINILM_DIM }
    }
}

#[cfg(test)]
impl EmbeddingModel for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        Ok(deterministic_vector(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
        Ok(texts.iter().map(|t| deterministic_vector(t, self.dimension)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
    let bytes = text.as_bytes();
    let v = (0..dim)
        .map(|i| {
            let byte = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
            (byte as f32 + i as f32) / 255.0
        })
        .collect();
    l2_normalize(v)
}
