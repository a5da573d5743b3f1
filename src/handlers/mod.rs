//! HTTP Handlers

pub mod orders;

use axum::response::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// ヘルスチェック
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "seafood-store".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
