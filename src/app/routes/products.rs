use super::Items;
use crate::app::envelope::{self, ApiJson, ApiResult};
use crate::app::form::ProductSubmission;
use crate::app::session::AdminSession;
use crate::app::state::AppState;
use crate::utils::validation::require_text;
use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";
const EXPORT_FILENAME: &str = "catalogue.zip";

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    category: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult {
    let products = state.services.catalogue.list_products().await?;
    Ok(Json(Items { items: products }).into_response())
}

pub async fn list_in_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult {
    let products = state.services.catalogue.products_in_category(&category).await?;
    Ok(Json(Items { items: products }).into_response())
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let product = state.services.catalogue.product(&id).await?;
    Ok(Json(Items { items: product }).into_response())
}

pub async fn fetch_image(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ImageRequest>,
) -> ApiResult {
    let url = require_text(request.url.as_deref(), "URL is required")?;
    let image = state.services.catalogue.fetch_image(&url).await?;

    Ok((
        [
            (CONTENT_TYPE, image.content_type),
            (CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        image.bytes,
    )
        .into_response())
}

pub async fn add(
    _admin: AdminSession,
    State(state): State<AppState>,
    submission: ProductSubmission,
) -> ApiResult {
    let product = state
        .services
        .catalogue
        .add_product(submission.input, submission.images)
        .await?;
    Ok(envelope::ok(product))
}

pub async fn update(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    submission: ProductSubmission,
) -> ApiResult {
    let product = state
        .services
        .catalogue
        .update_product(&id, submission.input, submission.images)
        .await?;
    Ok(envelope::ok(product))
}

pub async fn remove(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    state.services.catalogue.delete_product(&id).await?;
    Ok(envelope::ok(json!({
        "id": id,
        "message": "Product deleted successfully",
    })))
}

pub async fn download_pdf(_admin: AdminSession, State(state): State<AppState>) -> ApiResult {
    let products = state.services.catalogue.catalogue(None).await?;
    Ok(Json(Items { items: products }).into_response())
}

pub async fn download_pdf_category(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult {
    let products = state.services.catalogue.catalogue(Some(&category)).await?;
    Ok(Json(Items { items: products }).into_response())
}

pub async fn export(
    _admin: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let archive = state
        .services
        .catalogue
        .export_catalogue(query.category.as_deref())
        .await?;

    Ok((
        [
            (CONTENT_TYPE, "application/zip".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        archive,
    )
        .into_response())
}
