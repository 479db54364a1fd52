use crate::app::envelope::{self, ApiJson, ApiResult};
use crate::app::session::{expired_cookie, request_token, session_cookie, AdminSession};
use crate::app::state::AppState;
use crate::core::auth::IssuedToken;
use crate::utils::error::CatalogueError;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult {
    let issued = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;
    Ok(with_session(&state, issued))
}

pub async fn logout(admin: AdminSession, State(state): State<AppState>) -> ApiResult {
    tracing::info!(username = %admin.username, "🔐 Admin logged out");
    let cookie = expired_cookie(state.config.server.cookie_secure);
    Ok((
        [(SET_COOKIE, cookie)],
        envelope::ok(json!({ "message": "Logged out successfully" })),
    )
        .into_response())
}

/// Reports whether the caller holds a valid session. Any missing or bad token is a 401 here.
pub async fn check(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let claims = request_token(&headers)
        .and_then(|token| state.services.auth.verify(&token).ok())
        .ok_or_else(|| CatalogueError::Unauthorized {
            message: "Not logged in".to_string(),
        })?;

    Ok(Json(json!({ "loggedIn": true, "user": claims })).into_response())
}

pub async fn refresh(admin: AdminSession, State(state): State<AppState>) -> ApiResult {
    let issued = state.services.auth.refresh(&admin.token)?;
    Ok(with_session(&state, issued))
}

fn with_session(state: &AppState, issued: IssuedToken) -> Response {
    let cookie = session_cookie(
        &issued.token,
        state.services.auth.ttl_seconds(),
        state.config.server.cookie_secure,
    );
    ([(SET_COOKIE, cookie)], envelope::ok(issued)).into_response()
}
