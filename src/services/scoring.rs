// src/services/scoring.rs

//! Answer scoring and submission recording.
//!
//! `score_answers` is the pure part: it never touches the store. `submit`
//! wraps it with the batched question lookup before and the transactional
//! ledger write after. A write failure is surfaced as `Internal`; the computed
//! score is never returned without a committed submission behind it.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::{
    db::{QuestionRepository, SubmissionLedger},
    error::AppError,
    models::{
        question::{Question, normalize_option},
        submission::{
            AnswerInput, AnswerResult, LatestSubmission, LatestSubmissionResponse, NewSubmission,
            SubmitResponse,
        },
        user::Identity,
    },
};

/// Totals and per-answer breakdown for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredBatch {
    pub total_questions: i32,
    pub correct_answers: i32,
    pub details: Vec<AnswerResult>,
}

/// Distinct question ids in first-seen order.
pub fn unique_question_ids(answers: &[AnswerInput]) -> Vec<i64> {
    let mut seen = HashSet::new();
    answers
        .iter()
        .map(|a| a.question_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Scores a batch against the questions that were found.
///
/// Answers to unknown questions count as attempted and wrong.
pub fn score_answers(answers: &[AnswerInput], questions: &HashMap<i64, Question>) -> ScoredBatch {
    let mut total_questions = 0;
    let mut correct_answers = 0;
    let mut details = Vec::with_capacity(answers.len());

    for answer in answers {
        let selected = normalize_option(&answer.selected_option);

        let (is_correct, correct_option, question_text) = match questions.get(&answer.question_id) {
            Some(q) => {
                let correct = normalize_option(&q.correct_option);
                (selected == correct, Some(correct), Some(q.question_text.clone()))
            }
            None => (false, None, None),
        };

        total_questions += 1;
        if is_correct {
            correct_answers += 1;
        }

        details.push(AnswerResult {
            question_id: answer.question_id,
            question_text,
            selected_option: selected,
            is_correct,
            correct_option,
        });
    }

    ScoredBatch {
        total_questions,
        correct_answers,
        details,
    }
}

/// Percentage of correct answers, rounded half up. Zero when nothing was answered.
pub fn score_percent(correct_answers: i32, total_questions: i32) -> i32 {
    if total_questions <= 0 {
        return 0;
    }
    let correct = i64::from(correct_answers);
    let total = i64::from(total_questions);
    // floor(correct * 100 / total + 1/2)
    ((200 * correct + total) / (2 * total)) as i32
}

/// Scores a batch for `identity` and records it as one submission.
pub async fn submit<S>(
    store: &S,
    identity: Option<&Identity>,
    answers: &[AnswerInput],
) -> Result<SubmitResponse, AppError>
where
    S: QuestionRepository + SubmissionLedger + ?Sized,
{
    if answers.is_empty() {
        return Err(AppError::InvalidArgument(
            "answers must be a non-empty batch".to_string(),
        ));
    }

    let identity =
        identity.ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    let question_ids = unique_question_ids(answers);

    let questions = store.get_questions(&question_ids).await.map_err(|e| {
        tracing::error!("Question lookup failed: {:?}", e);
        AppError::unavailable(e)
    })?;

    if questions.is_empty() {
        return Err(AppError::InvalidArgument(
            "no matching questions found".to_string(),
        ));
    }

    let scored = score_answers(answers, &questions);

    let submission_id = store
        .record_submission(&NewSubmission {
            username: &identity.username,
            total_questions: scored.total_questions,
            correct_answers: scored.correct_answers,
            answers: &scored.details,
            created_at: Utc::now(),
        })
        .await
        .map_err(|e| {
            tracing::error!(username = %identity.username, "Failed to record submission: {:?}", e);
            AppError::Internal(e.to_string())
        })?;

    tracing::info!(
        username = %identity.username,
        submission_id,
        total = scored.total_questions,
        correct = scored.correct_answers,
        "Submission recorded"
    );

    Ok(SubmitResponse {
        status: "success".to_string(),
        username: identity.username.clone(),
        submission_id,
        total_questions: scored.total_questions,
        correct_answers: scored.correct_answers,
        score_percent: score_percent(scored.correct_answers, scored.total_questions),
        details: scored.details,
    })
}

/// The caller's most recent submission, by highest id.
pub async fn latest_submission<S>(
    store: &S,
    identity: &Identity,
) -> Result<LatestSubmissionResponse, AppError>
where
    S: SubmissionLedger + ?Sized,
{
    let record = store
        .latest_submission(&identity.username)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch latest submission: {:?}", e);
            AppError::unavailable(e)
        })?;

    let submission = record.map(|r| LatestSubmission {
        submission_id: r.submission.id,
        username: r.submission.username,
        total_questions: r.submission.total_questions,
        correct_answers: r.submission.correct_answers,
        score_percent: score_percent(r.submission.correct_answers, r.submission.total_questions),
        created_at: r.submission.created_at,
        answers: r.answers,
    });

    Ok(LatestSubmissionResponse {
        status: "ok".to_string(),
        submission,
    })
}
