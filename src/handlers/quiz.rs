// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    db::Store,
    error::{AppError, AppJson, ErrorBody},
    models::{
        question::{CreateQuestionRequest, CreateQuestionResponse, PublicQuestion},
        submission::{LatestSubmissionResponse, SubmitRequest, SubmitResponse},
        user::{Identity, TokenQuery},
    },
    services,
};

/// Lists every question without its correct option.
#[utoipa::path(
    get,
    path = "/questions",
    responses(
        (status = 200, description = "All questions, ordered by id", body = [PublicQuestion]),
        (status = 503, description = "Store unavailable", body = ErrorBody)
    ),
    tag = "quiz"
)]
pub async fn list_questions(
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<Vec<PublicQuestion>>, AppError> {
    let questions = services::questions::list_questions(store.as_ref()).await?;
    Ok(Json(questions))
}

/// Adds a question to the bank (staff only).
#[utoipa::path(
    post,
    path = "/questions",
    params(TokenQuery),
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = CreateQuestionResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Caller is not staff", body = ErrorBody)
    ),
    tag = "quiz"
)]
pub async fn create_question(
    State(store): State<Arc<dyn Store>>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = services::questions::create_question(store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Scores a batch of answers and records it as one submission.
///
/// Every call creates a new submission, including repeats of the same batch.
#[utoipa::path(
    post,
    path = "/submit",
    params(TokenQuery),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Batch scored and recorded", body = SubmitResponse),
        (status = 400, description = "Malformed or empty batch", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Submission could not be recorded", body = ErrorBody),
        (status = 503, description = "Store or identity service unavailable", body = ErrorBody)
    ),
    tag = "quiz"
)]
pub async fn submit(
    State(store): State<Arc<dyn Store>>,
    Extension(identity): Extension<Option<Identity>>,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let response =
        services::scoring::submit(store.as_ref(), identity.as_ref(), &payload.answers).await?;
    Ok(Json(response))
}

/// The caller's most recent submission, or `null` before the first one.
#[utoipa::path(
    get,
    path = "/submissions/latest",
    params(TokenQuery),
    responses(
        (status = 200, description = "Latest submission", body = LatestSubmissionResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tag = "quiz"
)]
pub async fn latest_submission(
    State(store): State<Arc<dyn Store>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<LatestSubmissionResponse>, AppError> {
    let response = services::scoring::latest_submission(store.as_ref(), &identity).await?;
    Ok(Json(response))
}
