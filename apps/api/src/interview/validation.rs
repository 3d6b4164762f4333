//! Form checks for interview definitions and recorded transcripts.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const MAX_POSITION_CHARS: usize = 100;
pub const MIN_DESCRIPTION_CHARS: usize = 10;
/// Transcripts shorter than this never reach the evaluator.
pub const MIN_TRANSCRIPT_CHARS: usize = 30;

/// A single failed field check, reported inline next to the field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// User-entered interview metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewForm {
    pub position: String,
    pub description: String,
    pub experience: f64,
    pub tech_stack: String,
}

impl InterviewForm {
    /// Collects every failing field rather than stopping at the first.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        let position_len = self.position.trim().chars().count();
        if position_len == 0 {
            errors.push(FieldError {
                field: "position",
                message: "Position is required",
            });
        } else if position_len > MAX_POSITION_CHARS {
            errors.push(FieldError {
                field: "position",
                message: "Position must be 100 characters or less",
            });
        }

        if self.description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
            errors.push(FieldError {
                field: "description",
                message: "Description is required",
            });
        }

        if !self.experience.is_finite() || self.experience < 0.0 {
            errors.push(FieldError {
                field: "experience",
                message: "Experience cannot be empty or negative",
            });
        }

        if self.tech_stack.trim().is_empty() {
            errors.push(FieldError {
                field: "techStack",
                message: "Tech stack must be at least one character long",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidForm(errors))
        }
    }

    /// Copy with surrounding whitespace removed from every text field.
    pub fn normalized(&self) -> Self {
        Self {
            position: self.position.trim().to_string(),
            description: self.description.trim().to_string(),
            experience: self.experience,
            tech_stack: self.tech_stack.trim().to_string(),
        }
    }
}

pub fn validate_transcript(transcript: &str) -> Result<(), AppError> {
    if transcript.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
        return Err(AppError::Validation(format!(
            "Your answer should be more than {MIN_TRANSCRIPT_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn require_user_id(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }
    Ok(())
}
