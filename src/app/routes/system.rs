use crate::config::AppConfig;
use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

pub async fn root(State(config): State<AppConfig>) -> impl IntoResponse {
    Json(json!({
        "message": "Catalogue API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment,
    }))
}

pub async fn health(State(config): State<AppConfig>) -> impl IntoResponse {
    (
        [(CACHE_CONTROL, "no-store")],
        Json(json!({
            "status": "healthy",
            "timestamp": Utc::now(),
            "environment": config.environment,
        })),
    )
}
