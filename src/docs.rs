// src/docs.rs

use axum::Json;
use utoipa::OpenApi;

use crate::{
    error::ErrorBody,
    handlers::{auth, health, profile, quiz},
    models::{
        profile::{ScoreUpdateRequest, ScoreUpdateResponse, UserProfile},
        question::{CreateQuestionRequest, CreateQuestionResponse, PublicQuestion},
        submission::{
            AnswerInput, AnswerResult, LatestSubmission, LatestSubmissionResponse,
            SubmissionAnswer, SubmitRequest, SubmitResponse,
        },
        user::{CreateUserRequest, Identity, LoginRequest, LoginResponse, ValidateResponse},
    },
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quiz Service",
        description = "Multiple-choice question bank, answer scoring and score profiles."
    ),
    paths(
        health::health,
        quiz::list_questions,
        quiz::create_question,
        quiz::submit,
        quiz::latest_submission,
        auth::register,
        auth::login,
        auth::me,
        auth::validate,
        profile::list_users,
        profile::get_user,
        profile::update_score,
    ),
    components(schemas(
        ErrorBody,
        PublicQuestion,
        CreateQuestionRequest,
        CreateQuestionResponse,
        AnswerInput,
        AnswerResult,
        SubmitRequest,
        SubmitResponse,
        SubmissionAnswer,
        LatestSubmission,
        LatestSubmissionResponse,
        Identity,
        CreateUserRequest,
        LoginRequest,
        LoginResponse,
        ValidateResponse,
        UserProfile,
        ScoreUpdateRequest,
        ScoreUpdateResponse,
    )),
    tags(
        (name = "quiz", description = "Question bank and scoring"),
        (name = "auth", description = "Accounts and token resolution"),
        (name = "profiles", description = "Per-user running scores"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
