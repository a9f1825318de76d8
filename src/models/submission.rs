// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One (question, selected option) pair in a submitted batch.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerInput {
    pub question_id: i64,
    #[serde(default)]
    pub selected_option: String,
}

/// DTO for submitting a batch of answers.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    pub answers: Vec<AnswerInput>,
}

/// Scored outcome of a single answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnswerResult {
    pub question_id: i64,
    pub question_text: Option<String>,
    pub selected_option: String,
    pub is_correct: bool,
    pub correct_option: Option<String>,
}

/// Response returned by `POST /submit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub status: String,
    pub username: String,
    pub submission_id: i64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score_percent: i32,
    pub details: Vec<AnswerResult>,
}

/// Rows the ledger writes for one scoring attempt.
#[derive(Debug)]
pub struct NewSubmission<'a> {
    pub username: &'a str,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub answers: &'a [AnswerResult],
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'submissions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Submission {
    pub id: i64,
    pub username: String,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'submission_answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct SubmissionAnswer {
    pub question_id: i64,
    pub selected_option: String,
    pub is_correct: bool,
}

/// A submission together with its answer rows, in insertion order.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub submission: Submission,
    pub answers: Vec<SubmissionAnswer>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestSubmission {
    pub submission_id: i64,
    pub username: String,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score_percent: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub answers: Vec<SubmissionAnswer>,
}

/// Response returned by `GET /submissions/latest`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LatestSubmissionResponse {
    pub status: String,
    pub submission: Option<LatestSubmission>,
}
