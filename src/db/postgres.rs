// src/db/postgres.rs

//! PostgreSQL adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use super::{PoolSettings, ProfileRepository, QuestionRepository, SubmissionLedger, UserRepository};
use crate::models::{
    profile::UserProfile,
    question::{NewQuestion, Question},
    submission::{NewSubmission, Submission, SubmissionAnswer, SubmissionRecord},
    user::{NewUser, User},
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgres");

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn insert_submission_rows(
    tx: &mut Transaction<'_, Postgres>,
    submission: &NewSubmission<'_>,
) -> Result<i64, sqlx::Error> {
    let submission_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO submissions (username, total_questions, correct_answers, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(submission.username)
    .bind(submission.total_questions)
    .bind(submission.correct_answers)
    .bind(submission.created_at)
    .fetch_one(&mut **tx)
    .await?;

    for answer in submission.answers {
        sqlx::query(
            r#"
            INSERT INTO submission_answers (submission_id, question_id, selected_option, is_correct)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(submission_id)
        .bind(answer.question_id)
        .bind(&answer.selected_option)
        .bind(answer.is_correct)
        .execute(&mut **tx)
        .await?;
    }

    Ok(submission_id)
}

#[async_trait]
impl QuestionRepository for PgStore {
    async fn list_questions(&self) -> Result<Vec<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, question_text, option_a, option_b, option_c, option_d, correct_option, created_at
            FROM questions
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_questions(&self, ids: &[i64]) -> Result<HashMap<i64, Question>, sqlx::Error> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, question_text, option_a, option_b, option_c, option_d, correct_option, created_at
            FROM questions
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|q| (q.id, q)).collect())
    }

    async fn create_question(&self, question: &NewQuestion) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions
                (question_text, option_a, option_b, option_c, option_d, correct_option, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&question.question_text)
        .bind(&question.option_a)
        .bind(&question.option_b)
        .bind(&question.option_c)
        .bind(&question.option_d)
        .bind(&question.correct_option)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(question_id = id, "Question created");
        Ok(id)
    }
}

#[async_trait]
impl SubmissionLedger for PgStore {
    async fn record_submission(&self, submission: &NewSubmission<'_>) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        match insert_submission_rows(&mut tx, submission).await {
            Ok(submission_id) => {
                tx.commit().await?;
                Ok(submission_id)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Submission rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn latest_submission(
        &self,
        username: &str,
    ) -> Result<Option<SubmissionRecord>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, username, total_questions, correct_answers, created_at
            FROM submissions
            WHERE username = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(submission) = submission else {
            return Ok(None);
        };

        let answers = sqlx::query_as::<_, SubmissionAnswer>(
            r#"
            SELECT question_id, selected_option, is_correct
            FROM submission_answers
            WHERE submission_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(submission.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SubmissionRecord { submission, answers }))
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn adjust_score(&self, username: &str, delta: i32) -> Result<Option<i32>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Make sure a row exists so concurrent first increments all lock the same row.
        sqlx::query(
            r#"
            INSERT INTO user_profiles (username, score)
            VALUES ($1, 0)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .execute(&mut *tx)
        .await?;

        let current: i32 =
            sqlx::query_scalar("SELECT score FROM user_profiles WHERE username = $1 FOR UPDATE")
                .bind(username)
                .fetch_one(&mut *tx)
                .await?;

        let Some(new_score) = current.checked_add(delta) else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE user_profiles SET score = $1 WHERE username = $2")
            .bind(new_score)
            .bind(username)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(new_score))
    }

    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT username, email, full_name, score FROM user_profiles WHERE LOWER(username) = LOWER($1) LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT username, email, full_name, score FROM user_profiles ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO users (username, password, email, first_name, last_name, is_staff, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_staff)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, email, first_name, last_name, is_staff, created_at
            FROM users
            WHERE LOWER(username) = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, email, first_name, last_name, is_staff, created_at
            FROM users
            WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
            ORDER BY (LOWER(username) = LOWER($1)) DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
    }
}
