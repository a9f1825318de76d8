// src/services/questions.rs

use validator::Validate;

use crate::{
    db::QuestionRepository,
    error::AppError,
    models::question::{
        CreateQuestionRequest, CreateQuestionResponse, NewQuestion, PublicQuestion,
        normalize_option,
    },
    utils::html::clean_text,
};

/// The question bank as shown to students: ordered by id, answers hidden.
pub async fn list_questions<S>(store: &S) -> Result<Vec<PublicQuestion>, AppError>
where
    S: QuestionRepository + ?Sized,
{
    let questions = store.list_questions().await.map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::unavailable(e)
    })?;

    Ok(questions.into_iter().map(PublicQuestion::from).collect())
}

pub async fn create_question<S>(
    store: &S,
    payload: CreateQuestionRequest,
) -> Result<CreateQuestionResponse, AppError>
where
    S: QuestionRepository + ?Sized,
{
    payload.validate()?;

    let question = NewQuestion {
        question_text: sanitized("question_text", &payload.question_text)?,
        option_a: sanitized("option_a", &payload.option_a)?,
        option_b: sanitized("option_b", &payload.option_b)?,
        option_c: sanitized("option_c", &payload.option_c)?,
        option_d: sanitized("option_d", &payload.option_d)?,
        correct_option: normalize_option(&payload.correct_option),
    };

    let id = store.create_question(&question).await?;

    Ok(CreateQuestionResponse {
        message: "Question created successfully".to_string(),
        id,
    })
}

fn sanitized(field: &str, raw: &str) -> Result<String, AppError> {
    let clean = clean_text(raw);
    if clean.is_empty() {
        return Err(AppError::InvalidArgument(format!(
            "{} is empty after sanitization",
            field
        )));
    }
    Ok(clean)
}
