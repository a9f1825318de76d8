// src/identity.rs

//! Bearer token to identity resolution.
//!
//! The workflows only ever see an `Identity`. Where it comes from is decided
//! once at startup: `LocalIdentityResolver` checks our own JWTs against the
//! users table, `HttpIdentityResolver` asks another instance's
//! `/api/auth/me` endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{db::UserRepository, error::AppError, models::user::Identity, utils::jwt::verify_jwt};

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` means the token is invalid or unknown.
    /// `Err` is reserved for the resolver itself being unreachable.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AppError>;
}

/// Verifies tokens signed by this service and loads the current account row.
pub struct LocalIdentityResolver<S: ?Sized> {
    store: Arc<S>,
    secret: String,
}

impl<S: ?Sized> LocalIdentityResolver<S> {
    pub fn new(store: Arc<S>, secret: impl Into<String>) -> Self {
        Self {
            store,
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl<S> IdentityResolver for LocalIdentityResolver<S>
where
    S: UserRepository + ?Sized,
{
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AppError> {
        let Ok(claims) = verify_jwt(token, &self.secret) else {
            return Ok(None);
        };

        let user = self.store.find_user(&claims.sub).await.map_err(|e| {
            tracing::error!("Identity lookup failed: {:?}", e);
            AppError::unavailable(e)
        })?;

        Ok(user.map(Identity::from))
    }
}

/// Delegates to a remote `GET <endpoint>?token=` identity service.
pub struct HttpIdentityResolver {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpIdentityResolver {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AppError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint = %self.endpoint, "Identity service unreachable: {}", e);
                AppError::Unavailable(format!("identity service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "Identity service rejected token");
            return Ok(None);
        }

        match response.json::<Identity>().await {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!("Identity service returned an undecodable body: {}", e);
                Ok(None)
            }
        }
    }
}
