// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::user::{Identity, TokenQuery},
    state::AppState,
};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the account's username.
    pub sub: String,
    pub is_staff: bool,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    username: &str,
    is_staff: bool,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: username.to_owned(),
        is_staff,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Pulls the bearer token from `?token=` or, failing that, the
/// `Authorization: Bearer <token>` header. Empty values count as absent.
pub fn extract_token(req: &Request<Body>) -> Option<String> {
    let from_query = Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.token);

    let token = from_query.or_else(|| {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned)
    })?;

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

async fn resolve_token(state: &AppState, token: Option<String>) -> Result<Option<Identity>, AppError> {
    match token {
        Some(token) => state.identity.resolve(&token).await,
        None => Ok(None),
    }
}

/// Axum Middleware: Authentication.
///
/// Resolves the request's token through the configured identity resolver
/// and injects the `Identity` into the request extensions.
/// Missing or invalid tokens are answered with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&req);
    let identity = resolve_token(&state, token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Axum Middleware: optional authentication.
///
/// Like `auth_middleware` but never rejects: it injects `Option<Identity>`
/// and leaves the decision to the handler.
pub async fn identify_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&req);
    let identity = resolve_token(&state, token).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Axum Middleware: Staff Authorization.
///
/// Must be used AFTER `auth_middleware`. Non-staff callers get 403.
pub async fn staff_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    if !identity.is_staff {
        return Err(AppError::Forbidden("Staff access required".to_string()));
    }

    Ok(next.run(req).await)
}
