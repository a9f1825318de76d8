// src/services/profile.rs

use crate::{
    db::ProfileRepository,
    error::AppError,
    models::{
        profile::{ScoreUpdateResponse, UserProfile},
        user::Identity,
    },
};

/// Applies a signed increment to the caller's own running score.
///
/// Only the owner may adjust a score. The aggregate is keyed by the
/// identity's canonical username, whatever casing the path used.
pub async fn adjust_score<S>(
    store: &S,
    identity: &Identity,
    username: &str,
    delta: i32,
) -> Result<ScoreUpdateResponse, AppError>
where
    S: ProfileRepository + ?Sized,
{
    if delta == 0 {
        return Err(AppError::InvalidArgument(
            "score_increment must be non-zero".to_string(),
        ));
    }

    if !identity.username.eq_ignore_ascii_case(username) {
        return Err(AppError::Forbidden(
            "Forbidden: can only update own score".to_string(),
        ));
    }

    let new_score = store
        .adjust_score(&identity.username, delta)
        .await
        .map_err(|e| {
            tracing::error!(username = %identity.username, "Failed to adjust score: {:?}", e);
            AppError::from(e)
        })?
        .ok_or_else(|| {
            AppError::InvalidArgument("score_increment would overflow the score".to_string())
        })?;

    tracing::debug!(username = %identity.username, delta, new_score, "Score adjusted");

    Ok(ScoreUpdateResponse {
        username: identity.username.clone(),
        new_score,
        increment: delta,
    })
}

pub async fn get_profile<S>(store: &S, username: &str) -> Result<UserProfile, AppError>
where
    S: ProfileRepository + ?Sized,
{
    store
        .get_profile(username)
        .await
        .map_err(AppError::unavailable)?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

pub async fn list_profiles<S>(store: &S) -> Result<Vec<UserProfile>, AppError>
where
    S: ProfileRepository + ?Sized,
{
    store.list_profiles().await.map_err(|e| {
        tracing::error!("Failed to list profiles: {:?}", e);
        AppError::unavailable(e)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemoryProfiles {
        scores: Mutex<HashMap<String, i32>>,
    }

    #[async_trait]
    impl ProfileRepository for MemoryProfiles {
        async fn adjust_score(&self, username: &str, delta: i32) -> Result<Option<i32>, sqlx::Error> {
            let mut scores = self.scores.lock().unwrap();
            let score = scores.entry(username.to_string()).or_insert(0);
            let Some(new_score) = score.checked_add(delta) else {
                return Ok(None);
            };
            *score = new_score;
            Ok(Some(new_score))
        }

        async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, sqlx::Error> {
            Ok(self.scores.lock().unwrap().get(username).map(|score| UserProfile {
                username: username.to_string(),
                email: None,
                full_name: None,
                score: *score,
            }))
        }

        async fn list_profiles(&self) -> Result<Vec<UserProfile>, sqlx::Error> {
            Ok(Vec::new())
        }
    }

    fn identity(username: &str) -> Identity {
        Identity {
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
            is_staff: false,
        }
    }

    #[tokio::test]
    async fn test_zero_delta_is_rejected() {
        let store = MemoryProfiles::default();
        let err = adjust_score(&store, &identity("amira"), "amira", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_other_users_score_is_forbidden() {
        let store = MemoryProfiles::default();
        let err = adjust_score(&store, &identity("amira"), "bayu", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_first_increment_creates_profile() {
        let store = MemoryProfiles::default();
        let res = adjust_score(&store, &identity("amira"), "Amira", 7).await.unwrap();
        assert_eq!(res.new_score, 7);
        assert_eq!(res.increment, 7);
        assert_eq!(res.username, "amira");

        let res = adjust_score(&store, &identity("amira"), "amira", -2).await.unwrap();
        assert_eq!(res.new_score, 5);
    }

    #[tokio::test]
    async fn test_overflowing_increment_is_rejected() {
        let store = MemoryProfiles::default();
        adjust_score(&store, &identity("amira"), "amira", i32::MAX).await.unwrap();

        let err = adjust_score(&store, &identity("amira"), "amira", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let profile = get_profile(&store, "amira").await.unwrap();
        assert_eq!(profile.score, i32::MAX);
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let store = MemoryProfiles::default();
        let err = get_profile(&store, "nobody").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
