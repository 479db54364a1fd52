use crate::config::AppConfig;
use crate::core::{Backends, Services};
use axum::extract::FromRef;
use std::ops::Deref;
use std::sync::Arc;

pub struct AppStateInner {
    pub config: AppConfig,
    pub services: Services,
}

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(config: AppConfig, backends: Backends) -> Self {
        let services = Services::new(backends, &config.auth);
        Self {
            inner: Arc::new(AppStateInner { config, services }),
        }
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.inner.config.clone()
    }
}
