/*
 * Responsibility
 * - GET /health (疎通用)
 * - 既定で permit-all (AUTH_URL_PERMIT_ALL) に入っているので token なしで通る
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
