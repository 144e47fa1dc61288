use axum::{http::StatusCode, response::IntoResponse, Json};

/// Liveness probe. Does not touch storage.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
