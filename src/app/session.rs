use super::envelope::ApiError;
use super::state::AppState;
use crate::utils::error::CatalogueError;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

pub const AUTH_COOKIE: &str = "auth_token";

/// The caller's token, from `Authorization: Bearer` or the `auth_token` cookie.
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, AUTH_COOKIE))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let secure = if secure { " Secure;" } else { "" };
    format!(
        "{}={}; HttpOnly;{} SameSite=Strict; Path=/; Max-Age={}",
        AUTH_COOKIE, token, secure, max_age_seconds
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// An authenticated admin. Extracting it rejects the request with 401 when no
/// token was sent and 403 when the token is invalid or expired.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub username: String,
    pub token: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers).ok_or_else(|| CatalogueError::Unauthorized {
            message: "No token provided".to_string(),
        })?;

        let claims = state.services.auth.verify(&token)?;
        Ok(Self {
            username: claims.username,
            token,
        })
    }
}
