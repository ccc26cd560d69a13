pub mod products;
pub mod report;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// OpenAPI description of the HTTP surface, compiled into the binary.
const API_DOCUMENT: &str = include_str!("../../openapi.json");

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "service": "inventory-service" })))
}

pub async fn api_docs() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], API_DOCUMENT)
}
