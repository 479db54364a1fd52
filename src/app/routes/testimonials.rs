use super::Items;
use crate::app::envelope::{self, ApiJson, ApiResult};
use crate::app::session::AdminSession;
use crate::app::state::AppState;
use crate::domain::model::TestimonialInput;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn list(State(state): State<AppState>) -> ApiResult {
    let testimonials = state.services.testimonials.list().await?;
    Ok(Json(Items { items: testimonials }).into_response())
}

pub async fn add(
    _admin: AdminSession,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TestimonialInput>,
) -> ApiResult {
    let testimonial = state.services.testimonials.add(input).await?;
    Ok(envelope::created(json!({
        "id": testimonial.id,
        "message": "Testimonial added successfully",
    })))
}

pub async fn update(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TestimonialInput>,
) -> ApiResult {
    let testimonial = state.services.testimonials.update(&id, input).await?;
    Ok(envelope::ok(testimonial))
}

pub async fn remove(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    state.services.testimonials.delete(&id).await?;
    Ok(envelope::ok(json!({
        "id": id,
        "message": "Testimonial deleted successfully",
    })))
}
