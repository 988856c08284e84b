use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Pregnancy Risk Triage Assistant";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the hosted-model credential.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TOP_K: usize = 2;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_ONNX_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "pregnancy_triage_lib=info,pregnancy_triage=info,tower_http=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set; add it to the environment or a .env file")]
    MissingSecret(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which embedding backend indexes the corpus and the queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Hosted Gemini `embedContent` endpoint, same API key as generation.
    Gemini,
    /// Local all-MiniLM-L6-v2 through ONNX Runtime (`onnx-embeddings` feature).
    Onnx,
}

impl EmbedderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Onnx => "onnx",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "onnx" => Ok(Self::Onnx),
            _ => Err(ConfigError::InvalidValue {
                key: "TRIAGE_EMBEDDER",
                value: value.to_string(),
                reason: "expected \"gemini\" or \"onnx\"".into(),
            }),
        }
    }
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub data_dir: PathBuf,
    pub corpus_recursive: bool,
    pub bind_addr: SocketAddr,
    pub model: String,
    pub temperature: f32,
    pub top_k: usize,
    pub embedder: EmbedderKind,
    pub embedding_model: String,
    pub onnx_model_dir: PathBuf,
    pub gemini_base_url: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from the process environment, after merging a
    /// `.env` file from the working directory if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_ENV).ok_or(ConfigError::MissingSecret(API_KEY_ENV))?;

        let bind_raw = get("TRIAGE_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "TRIAGE_BIND",
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let temperature = parse_or(get("TRIAGE_TEMPERATURE"), "TRIAGE_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "TRIAGE_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be within 0.0..=2.0".into(),
            });
        }

        let top_k = parse_or(get("TRIAGE_TOP_K"), "TRIAGE_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRIAGE_TOP_K",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let embedder = match get("TRIAGE_EMBEDDER") {
            Some(v) => EmbedderKind::parse(&v)?,
            None => EmbedderKind::Gemini,
        };

        Ok(Self {
            api_key,
            data_dir: PathBuf::from(get("TRIAGE_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            corpus_recursive: parse_or(get("TRIAGE_CORPUS_RECURSIVE"), "TRIAGE_CORPUS_RECURSIVE", false)?,
            bind_addr,
            model: get("TRIAGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            temperature,
            top_k,
            embedder,
            embedding_model: get("TRIAGE_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.into()),
            onnx_model_dir: PathBuf::from(
                get("TRIAGE_ONNX_MODEL_DIR").unwrap_or_else(|| DEFAULT_ONNX_MODEL_DIR.into()),
            ),
            gemini_base_url: get("TRIAGE_GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            timeout_secs: parse_or(get("TRIAGE_TIMEOUT_SECS"), "TRIAGE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value,
                reason: e.to_string(),
            }),
    }
}
