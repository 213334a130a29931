use axum::Json;
use serde_json::{Value, json};

// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "System"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
