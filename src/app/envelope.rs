//! JSON envelope shared by the admin endpoints and every error response:
//! `{ success, statusCode, data | error { code, message, details? }, timestamp }`.

use crate::utils::error::CatalogueError;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = Envelope {
        success: true,
        status_code: status.as_u16(),
        data: Some(data),
        error: None,
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}

pub fn ok<T: Serialize>(data: T) -> Response {
    success(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> Response {
    success(StatusCode::CREATED, data)
}

pub fn failure(status: StatusCode, error: ErrorBody) -> Response {
    let body: Envelope<()> = Envelope {
        success: false,
        status_code: status.as_u16(),
        data: None,
        error: Some(error),
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}

/// Attached to 500 responses so the detail layer can re-render them with the cause.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub body: ErrorBody,
    pub cause: String,
}

/// Handler error: renders a `CatalogueError` as an envelope with the matching status.
#[derive(Debug)]
pub struct ApiError(pub CatalogueError);

impl From<CatalogueError> for ApiError {
    fn from(err: CatalogueError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CatalogueError::validation(rejection.body_text()))
    }
}

/// `Json` whose rejection is rendered as a 400 envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            CatalogueError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            CatalogueError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            CatalogueError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CatalogueError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CatalogueError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
            ),
        }
    }

    fn client_message(&self) -> String {
        match &self.0 {
            CatalogueError::ValidationError { message }
            | CatalogueError::Unauthorized { message }
            | CatalogueError::Forbidden { message }
            | CatalogueError::Conflict { message } => message.clone(),
            CatalogueError::NotFound { .. } => self.0.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            code,
            message: self.client_message(),
            details: None,
        };

        if self.0.is_client_error() {
            tracing::warn!(status = status.as_u16(), "{}", self.0);
            return failure(status, body);
        }

        tracing::error!(status = status.as_u16(), "❌ {}", self.0);
        let report = ErrorReport {
            status,
            body: body.clone(),
            cause: self.0.to_string(),
        };
        let mut response = failure(status, body);
        response.extensions_mut().insert(report);
        response
    }
}

pub type ApiResult<T = Response> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CatalogueError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                CatalogueError::Unauthorized {
                    message: "No token provided".to_string(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                CatalogueError::Forbidden {
                    message: "Invalid or expired token".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (CatalogueError::not_found("Product p-1"), StatusCode::NOT_FOUND),
            (
                CatalogueError::Conflict {
                    message: "taken".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                CatalogueError::database("Scan", "timeout"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_server_errors_carry_report() {
        let response = ApiError(CatalogueError::database("Scan", "timeout")).into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.body.message, "Internal server error");
        assert_eq!(report.cause, "DynamoDB Scan failed: timeout");

        let response = ApiError(CatalogueError::validation("bad")).into_response();
        assert!(response.extensions().get::<ErrorReport>().is_none());
    }
}
