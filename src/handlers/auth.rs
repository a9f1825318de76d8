// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    config::Config,
    db::Store,
    error::{AppError, AppJson, ErrorBody},
    models::user::{
        CreateUserRequest, Identity, LoginRequest, LoginResponse, TokenQuery, ValidateResponse,
    },
    services,
    state::AppState,
};

/// Registers a new user.
///
/// Returns 201 Created and the new identity (never the password).
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = Identity),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Username taken", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    State(store): State<Arc<dyn Store>>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = services::auth::register(store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

/// Authenticates a user and returns a JWT token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Bad credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = services::auth::login(store.as_ref(), &config, payload).await?;
    Ok(Json(response))
}

/// The identity behind the caller's token.
///
/// Other instances running in microservice mode resolve tokens against this endpoint.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    params(TokenQuery),
    responses(
        (status = 200, description = "Resolved identity", body = Identity),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

/// Reports whether a token currently resolves to an identity.
#[utoipa::path(
    get,
    path = "/api/auth/validate",
    params(TokenQuery),
    responses(
        (status = 200, description = "Validity of the token", body = ValidateResponse),
        (status = 503, description = "Identity resolver unreachable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn validate(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ValidateResponse>, AppError> {
    let valid = match query.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => state.identity.resolve(token).await?.is_some(),
        _ => false,
    };
    Ok(Json(ValidateResponse { valid }))
}
