// src/db/sqlite.rs

//! SQLite adapter, used for single-node deployments and the test-suite.
//!
//! SQLite has no row locks. Score adjustments therefore run as a single
//! upsert statement inside the transaction, which takes the database write
//! lock for the whole read-modify-write.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use super::{PoolSettings, ProfileRepository, QuestionRepository, SubmissionLedger, UserRepository};
use crate::models::{
    profile::UserProfile,
    question::{NewQuestion, Question},
    submission::{NewSubmission, Submission, SubmissionAnswer, SubmissionRecord},
    user::{NewUser, User},
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Stays well under SQLite's limit of 32766 bound variables per statement.
const LOOKUP_CHUNK: usize = 10_000;

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn insert_submission_rows(
    tx: &mut Transaction<'_, Sqlite>,
    submission: &NewSubmission<'_>,
) -> Result<i64, sqlx::Error> {
    let submission_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO submissions (username, total_questions, correct_answers, created_at)
        VALUES (?, ?, ?, ?)
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
            VALUES (?, ?, ?, ?)
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
impl QuestionRepository for SqliteStore {
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
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut questions = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(LOOKUP_CHUNK) {
            // Dynamic IN clause
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "SELECT id, question_text, option_a, option_b, option_c, option_d, correct_option, created_at
                FROM questions WHERE id IN (",
            );

            let mut separated = query_builder.separated(",");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let rows: Vec<Question> = query_builder
                .build_query_as()
                .fetch_all(&self.pool)
                .await?;

            questions.extend(rows.into_iter().map(|q| (q.id, q)));
        }

        Ok(questions)
    }

    async fn create_question(&self, question: &NewQuestion) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions
                (question_text, option_a, option_b, option_c, option_d, correct_option, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
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
impl SubmissionLedger for SqliteStore {
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
            WHERE username = ?
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
            WHERE submission_id = ?
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
impl ProfileRepository for SqliteStore {
    async fn adjust_score(&self, username: &str, delta: i32) -> Result<Option<i32>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // SQLite integers are 64-bit, so the sum is checked against the i32 range
        // in SQL. An out-of-range sum updates nothing and returns no row.
        let new_score: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO user_profiles (username, score)
            VALUES (?, ?)
            ON CONFLICT (username) DO UPDATE SET score = score + excluded.score
            WHERE score + excluded.score BETWEEN -2147483648 AND 2147483647
            RETURNING score
            "#,
        )
        .bind(username)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(new_score)
    }

    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT username, email, full_name, score FROM user_profiles WHERE username = ? COLLATE NOCASE LIMIT 1",
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
impl UserRepository for SqliteStore {
    async fn create_user(&self, user: &NewUser) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO users (username, password, email, first_name, last_name, is_staff, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
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
            WHERE username = ?1 COLLATE NOCASE
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
            WHERE username = ?1 COLLATE NOCASE OR email = ?1 COLLATE NOCASE
            ORDER BY (username = ?1 COLLATE NOCASE) DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
    }
}
