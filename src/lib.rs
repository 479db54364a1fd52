pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::{router, AppState};
pub use config::AppConfig;
pub use crate::core::{Backends, Services};
pub use utils::error::{CatalogueError, Result};
