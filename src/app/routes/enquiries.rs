use super::Items;
use crate::app::envelope::{self, ApiJson, ApiResult};
use crate::app::session::AdminSession;
use crate::app::state::AppState;
use crate::domain::model::EnquiryInput;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn submit(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EnquiryInput>,
) -> ApiResult {
    let enquiry = state.services.enquiries.submit(input).await?;
    Ok(envelope::created(enquiry))
}

pub async fn list(_admin: AdminSession, State(state): State<AppState>) -> ApiResult {
    let enquiries = state.services.enquiries.list().await?;
    Ok(Json(Items { items: enquiries }).into_response())
}

pub async fn send_email(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EnquiryInput>,
) -> ApiResult {
    state.services.enquiries.email(input).await?;
    Ok(Json(json!({ "message": "Email sent successfully!" })).into_response())
}

pub async fn send_sms(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EnquiryInput>,
) -> ApiResult {
    state.services.enquiries.sms(input).await?;
    Ok(Json(json!({ "message": "SMS sent successfully!" })).into_response())
}
