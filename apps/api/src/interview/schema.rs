//! Shape checks applied to sanitized AI output before anything uses it.

use serde_json::Value;
use thiserror::Error;

use crate::interview::evaluator::Evaluation;
use crate::models::interview::QuestionAnswer;

/// Number of question/answer pairs every interview carries.
pub const QUESTION_COUNT: usize = 5;
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("expected a JSON {0}")]
    WrongType(&'static str),

    #[error("expected {expected} question/answer pairs, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("element {index} is not an object")]
    NotAnObject { index: usize },

    #[error("element {index} is missing a non-empty string `{field}`")]
    MissingPairField { index: usize, field: &'static str },

    #[error("missing a non-empty string `{0}`")]
    MissingField(&'static str),

    #[error("rating {0} is outside 1-10")]
    RatingOutOfRange(f64),

    #[error("missing a numeric `ratings`")]
    MissingRating,
}

/// Accepts exactly `QUESTION_COUNT` objects, each with non-empty string
/// `question` and `answer`. Extra keys are ignored.
pub fn validate_question_set(value: &Value) -> Result<Vec<QuestionAnswer>, SchemaError> {
    let items = value.as_array().ok_or(SchemaError::WrongType("array"))?;
    if items.len() != QUESTION_COUNT {
        return Err(SchemaError::WrongCount {
            expected: QUESTION_COUNT,
            actual: items.len(),
        });
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<QuestionAnswer, SchemaError> {
            let obj = item.as_object().ok_or(SchemaError::NotAnObject { index })?;
            let field = |name: &'static str| {
                obj.get(name)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .ok_or(SchemaError::MissingPairField { index, field: name })
            };
            Ok(QuestionAnswer {
                question: field("question")?,
                answer: field("answer")?,
            })
        })
        .collect()
}

/// Accepts `{"ratings": 1-10, "feedback": "..."}`. `rating` is taken as an
/// alias, numeric strings are accepted, and fractional ratings are rounded.
pub fn validate_evaluation(value: &Value) -> Result<Evaluation, SchemaError> {
    let obj = value.as_object().ok_or(SchemaError::WrongType("object"))?;

    let raw_rating = obj
        .get("ratings")
        .or_else(|| obj.get("rating"))
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .ok_or(SchemaError::MissingRating)?;

    if !(MIN_RATING..=MAX_RATING).contains(&raw_rating) {
        return Err(SchemaError::RatingOutOfRange(raw_rating));
    }

    let feedback = obj
        .get("feedback")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SchemaError::MissingField("feedback"))?;

    Ok(Evaluation {
        rating: raw_rating.round() as u8,
        feedback: feedback.to_string(),
    })
}
