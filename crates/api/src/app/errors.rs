use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

/// Error body used by every handler: `{"error": "<message>"}`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
        })),
    )
        .into_response()
}
