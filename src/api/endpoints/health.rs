//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub documents: usize,
    pub chunks: usize,
    pub embedding_dimension: usize,
    pub model: String,
}

/// `GET /health` — liveness plus what the engine indexed at startup.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let stats = ctx.engine.stats;
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        documents: stats.documents,
        chunks: stats.chunks,
        embedding_dimension: stats.dimension,
        model: ctx.engine.model.clone(),
    })
}
