use super::Items;
use crate::app::envelope::{self, ApiJson, ApiResult};
use crate::app::session::AdminSession;
use crate::app::state::AppState;
use crate::domain::model::CategoryChanges;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn list(State(state): State<AppState>) -> ApiResult {
    let categories = state.services.categories.list().await?;
    Ok(Json(Items { items: categories }).into_response())
}

pub async fn save(
    admin: AdminSession,
    State(state): State<AppState>,
    ApiJson(changes): ApiJson<CategoryChanges>,
) -> ApiResult {
    tracing::info!(username = %admin.username, "Saving category changes");
    let (categories, summary) = state.services.categories.save(changes).await?;
    Ok(envelope::ok(json!({
        "message": "Categories updated successfully",
        "categories": categories,
        "summary": summary,
    })))
}
