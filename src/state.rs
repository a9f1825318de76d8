// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, db::Store, identity::IdentityResolver};

/// Shared, cheaply clonable application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityResolver>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
