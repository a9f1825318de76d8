// src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Represents the 'user_profiles' table: the per-user running score.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct UserProfile {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub score: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreUpdateRequest {
    /// Signed, non-zero amount added to the running score.
    pub score_increment: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreUpdateResponse {
    pub username: String,
    pub new_score: i32,
    pub increment: i32,
}
