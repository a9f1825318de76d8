// src/handlers/profile.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    db::Store,
    error::{AppError, AppJson, ErrorBody},
    models::{
        profile::{ScoreUpdateRequest, ScoreUpdateResponse, UserProfile},
        user::{Identity, TokenQuery},
    },
    services,
};

/// Lists all score profiles (staff only).
#[utoipa::path(
    get,
    path = "/users",
    params(TokenQuery),
    responses(
        (status = 200, description = "All profiles, ordered by id", body = [UserProfile]),
        (status = 403, description = "Caller is not staff", body = ErrorBody)
    ),
    tag = "profiles"
)]
pub async fn list_users(
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let profiles = services::profile::list_profiles(store.as_ref()).await?;
    Ok(Json(profiles))
}

#[utoipa::path(
    get,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Profile owner")),
    responses(
        (status = 200, description = "The profile", body = UserProfile),
        (status = 404, description = "No profile for this user", body = ErrorBody)
    ),
    tag = "profiles"
)]
pub async fn get_user(
    State(store): State<Arc<dyn Store>>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = services::profile::get_profile(store.as_ref(), &username).await?;
    Ok(Json(profile))
}

/// Adds a signed increment to the caller's own score.
#[utoipa::path(
    post,
    path = "/users/{username}/score",
    params(("username" = String, Path, description = "Profile owner"), TokenQuery),
    request_body = ScoreUpdateRequest,
    responses(
        (status = 200, description = "New absolute score", body = ScoreUpdateResponse),
        (status = 400, description = "Zero or malformed increment", body = ErrorBody),
        (status = 403, description = "Not the caller's own profile", body = ErrorBody)
    ),
    tag = "profiles"
)]
pub async fn update_score(
    State(store): State<Arc<dyn Store>>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
    AppJson(payload): AppJson<ScoreUpdateRequest>,
) -> Result<Json<ScoreUpdateResponse>, AppError> {
    let response = services::profile::adjust_score(
        store.as_ref(),
        &identity,
        &username,
        payload.score_increment,
    )
    .await?;
    Ok(Json(response))
}
