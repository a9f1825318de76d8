// src/db/mod.rs

//! Storage backends.
//!
//! Every workflow talks to the store through the repository traits below.
//! `PgStore` and `SqliteStore` are the two adapters; `connect` picks one from
//! the `DATABASE_URL` scheme, runs that backend's migrations and hands back a
//! shared trait object.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    profile::UserProfile,
    question::{NewQuestion, Question},
    submission::{NewSubmission, SubmissionRecord},
    user::{NewUser, User},
};

pub mod postgres;
pub mod sqlite;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Read access to the question bank, plus staff-side creation.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions, ordered by id ascending.
    async fn list_questions(&self) -> Result<Vec<Question>, sqlx::Error>;

    /// One batched lookup. Ids that do not exist are simply absent from the map.
    async fn get_questions(&self, ids: &[i64]) -> Result<HashMap<i64, Question>, sqlx::Error>;

    async fn create_question(&self, question: &NewQuestion) -> Result<i64, sqlx::Error>;
}

/// Append-only record of scoring attempts.
#[async_trait]
pub trait SubmissionLedger: Send + Sync {
    /// Inserts the submission row and every answer row in one transaction.
    /// Returns the new submission id; on error nothing is committed.
    async fn record_submission(&self, submission: &NewSubmission<'_>) -> Result<i64, sqlx::Error>;

    /// The user's submission with the highest id, with its answers in insertion order.
    async fn latest_submission(&self, username: &str)
    -> Result<Option<SubmissionRecord>, sqlx::Error>;
}

/// Per-user running score.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Adds `delta` to the user's score under a row lock, creating the row on first use.
    /// Returns the new absolute score, or `None` when the sum would leave the `i32`
    /// range; the stored score is then left unchanged.
    async fn adjust_score(&self, username: &str, delta: i32) -> Result<Option<i32>, sqlx::Error>;

    /// Case-insensitive lookup by username.
    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, sqlx::Error>;

    /// All profiles, ordered by id ascending.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, sqlx::Error>;
}

/// Accounts backing the local identity resolver.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<i64, sqlx::Error>;

    /// Case-insensitive lookup by username.
    async fn find_user(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    /// Case-insensitive lookup by username or email.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error>;
}

/// Everything a full deployment needs from its backend.
pub trait Store: QuestionRepository + SubmissionLedger + ProfileRepository + UserRepository {}

impl<T> Store for T where T: QuestionRepository + SubmissionLedger + ProfileRepository + UserRepository
{}

/// Options shared by both adapters.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: std::time::Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 16,
            acquire_timeout: std::time::Duration::from_secs(3),
        }
    }
}

/// Connects to the backend named by `database_url`, applies its migrations,
/// and returns it as a shared store.
pub async fn connect(
    database_url: &str,
    settings: &PoolSettings,
) -> Result<Arc<dyn Store>, sqlx::Error> {
    if database_url.starts_with("sqlite:") {
        let store = SqliteStore::connect(database_url, settings).await?;
        store.migrate().await?;
        Ok(Arc::new(store))
    } else if database_url.starts_with("postgres:") || database_url.starts_with("postgresql:") {
        let store = PgStore::connect(database_url, settings).await?;
        store.migrate().await?;
        Ok(Arc::new(store))
    } else {
        let scheme = database_url.split(':').next().unwrap_or_default();
        Err(sqlx::Error::Configuration(
            format!("unsupported DATABASE_URL scheme: {}", scheme).into(),
        ))
    }
}
