// src/lib.rs

pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

pub use routes::create_router;

use crate::{
    config::Config,
    db::Store,
    identity::{HttpIdentityResolver, IdentityResolver, LocalIdentityResolver},
    state::AppState,
};

/// Picks the identity resolver for this deployment: remote when
/// `IDENTITY_URL` is configured, local JWT verification otherwise.
pub fn identity_resolver(
    config: &Config,
    store: Arc<dyn Store>,
) -> Result<Arc<dyn IdentityResolver>, reqwest::Error> {
    match &config.identity_url {
        Some(endpoint) => {
            tracing::info!(%endpoint, "Resolving identities remotely");
            let timeout = Duration::from_secs(config.identity_timeout_secs);
            Ok(Arc::new(HttpIdentityResolver::new(endpoint.clone(), timeout)?))
        }
        None => Ok(Arc::new(LocalIdentityResolver::new(
            store,
            config.jwt_secret.clone(),
        ))),
    }
}

/// Wires a store and config into the shared application state.
pub fn build_state(config: Config, store: Arc<dyn Store>) -> Result<AppState, reqwest::Error> {
    let identity = identity_resolver(&config, store.clone())?;
    Ok(AppState {
        store,
        identity,
        config,
    })
}
