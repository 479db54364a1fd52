mod auth;
mod categories;
mod enquiries;
mod products;
mod system;
mod testimonials;

use super::envelope::{failure, ErrorBody, ErrorReport};
use super::state::AppState;
use crate::utils::logger;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// `{ items }` body of the listing endpoints.
#[derive(Debug, Serialize)]
pub struct Items<T: Serialize> {
    pub items: T,
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/products-list", get(products::list))
        .route("/products-list/{category}", get(products::list_in_category))
        .route("/product/{id}", get(products::get_one))
        .route("/fetch-s3-image", post(products::fetch_image))
        .route("/categories-list", get(categories::list))
        .route("/testimonials-list", get(testimonials::list))
        .route("/save-customer-enquiry", post(enquiries::submit))
        .route("/sendEmail", post(enquiries::send_email))
        .route("/sendSMS", post(enquiries::send_sms))
        .route("/login", post(auth::login))
        .route("/api/login", post(auth::login))
        .route("/api/auth/check", get(auth::check));

    let admin = Router::new()
        .route("/add-product", post(products::add))
        .route("/update-product/{id}", post(products::update))
        .route("/delete-product/{id}", delete(products::remove))
        .route("/downloadPDF", get(products::download_pdf))
        .route("/downloadPDF/{category}", get(products::download_pdf_category))
        .route("/export-catalogue", get(products::export))
        .route("/save-categories", post(categories::save))
        .route("/add-testimonial", post(testimonials::add))
        .route("/update-testimonial/{id}", put(testimonials::update))
        .route("/delete-testimonial/{id}", delete(testimonials::remove))
        .route("/enquiries-list", get(enquiries::list))
        .route("/api/logout", post(auth::logout))
        .route("/api/auth/refresh", post(auth::refresh));

    let mut app = public
        .merge(admin)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(state.config.server.max_request_size));

    if !state.config.is_production() {
        app = app.layer(middleware::map_response(expose_error_details));
    }

    app.layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors_layer(&state.config.server.cors_origin))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| logger::request_span(request)),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    // Credentialed CORS cannot answer with `*`, so a wildcard mirrors the caller.
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| {
                HeaderValue::from_str(o)
                    .inspect_err(|_| tracing::warn!(origin = %o, "Ignoring invalid CORS origin"))
                    .ok()
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

async fn route_not_found(method: Method, uri: Uri) -> Response {
    failure(
        StatusCode::NOT_FOUND,
        ErrorBody {
            code: "NOT_FOUND",
            message: format!("Route {} {} not found", method, uri.path()),
            details: None,
        },
    )
}

/// Outside production, server errors are re-rendered with their cause in `details`.
async fn expose_error_details(response: Response) -> Response {
    match response.extensions().get::<ErrorReport>() {
        Some(report) => {
            let mut body = report.body.clone();
            body.details = Some(report.cause.clone());
            failure(report.status, body)
        }
        None => response,
    }
}
