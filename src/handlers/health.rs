//! Health check handlers

use axum::Json;
use serde::Serialize;

use crate::models::RootResponse;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "API fonctionne",
    })
}

pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
