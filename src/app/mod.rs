// HTTP layer: router, extractors and the response envelope.
pub mod envelope;
pub mod form;
pub mod routes;
pub mod session;
pub mod state;

pub use routes::router;
pub use state::AppState;
