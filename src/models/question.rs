// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// The fixed, ordered set of option labels.
pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// Trims and upper-cases a submitted or stored option label.
pub fn normalize_option(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_option_label(label: &str) -> bool {
    OPTION_LABELS.contains(&label)
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The prompt shown to the student.
    pub question_text: String,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// One of `A`, `B`, `C`, `D`.
    pub correct_option: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending question to client (excludes the correct option).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            option_a: q.option_a,
            option_b: q.option_b,
            option_c: q.option_c,
            option_d: q.option_d,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateQuestionRequest {
    #[validate(custom(function = validate_text))]
    pub question_text: String,
    #[validate(custom(function = validate_text))]
    pub option_a: String,
    #[validate(custom(function = validate_text))]
    pub option_b: String,
    #[validate(custom(function = validate_text))]
    pub option_c: String,
    #[validate(custom(function = validate_text))]
    pub option_d: String,
    #[validate(custom(function = validate_correct_option))]
    pub correct_option: String,
}

/// A validated, sanitized question ready to be stored.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateQuestionResponse {
    pub message: String,
    pub id: i64,
}

fn validate_text(text: &str) -> Result<(), validator::ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(validator::ValidationError::new("text_cannot_be_blank"));
    }
    if trimmed.len() > 1000 {
        return Err(validator::ValidationError::new("text_too_long"));
    }
    Ok(())
}

fn validate_correct_option(option: &str) -> Result<(), validator::ValidationError> {
    if !is_option_label(&normalize_option(option)) {
        return Err(validator::ValidationError::new(
            "correct_option_must_be_one_of_a_b_c_d",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(correct: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_text: "Which word is a synonym of 'rapid'?".into(),
            option_a: "slow".into(),
            option_b: "quick".into(),
            option_c: "late".into(),
            option_d: "calm".into(),
            correct_option: correct.into(),
        }
    }

    #[test]
    fn test_normalize_option() {
        assert_eq!(normalize_option(" c "), "C");
        assert_eq!(normalize_option(""), "");
    }

    #[test]
    fn test_lowercase_correct_option_is_accepted() {
        assert!(request("b").validate().is_ok());
    }

    #[test]
    fn test_out_of_range_correct_option_is_rejected() {
        assert!(request("E").validate().is_err());
        assert!(request("").validate().is_err());
    }

    #[test]
    fn test_blank_option_text_is_rejected() {
        let mut req = request("A");
        req.option_c = "   ".into();
        assert!(req.validate().is_err());
    }
}
