use axum::http::{HeaderMap, Request};
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "catalogue_api=info,tower_http=info";
const VERBOSE_FILTER: &str = "catalogue_api=debug,tower_http=debug,info";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Compact console output for the server binary. `RUST_LOG` overrides the filter.
pub fn init_cli_logger(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };

    tracing_subscriber::registry()
        .with(env_filter(fallback))
        .with(fmt::layer().with_target(verbose).compact())
        .init();
}

/// One JSON object per line for CloudWatch, which stamps its own time.
/// The current request span is flattened into every event.
pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .without_time(),
        )
        .init();
}

/// The id the request-id layer assigned, or `-` when there is none.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

/// Span wrapping one HTTP request; every log line inside a handler carries its request id.
pub fn request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request.headers()),
    )
}
