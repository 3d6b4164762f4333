//! Answer Evaluator — scores a transcript against the reference answer.
//!
//! Never fails: any AI, sanitize or schema problem degrades to
//! `Evaluation::fallback()` so the answer can still be saved.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::interview::prompts::EVALUATION_PROMPT_TEMPLATE;
use crate::interview::schema::{validate_evaluation, SchemaError};
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::sanitize::{extract_json_collapsing_newlines, JsonShape, SanitizeError};
use crate::llm_client::{AiService, LlmError};

pub const FALLBACK_FEEDBACK: &str = "Unable to generate feedback";

/// Score and feedback for one answer. Copied into a `UserAnswer` on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub rating: u8,
    pub feedback: String,
}

impl Evaluation {
    pub fn fallback() -> Self {
        Self {
            rating: 0,
            feedback: FALLBACK_FEEDBACK.to_string(),
        }
    }
}

#[derive(Debug, Error)]
enum EvaluationError {
    #[error("AI call failed: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    #[error("unexpected evaluation shape: {0}")]
    Schema(#[from] SchemaError),
}

pub fn build_evaluation_prompt(question: &str, reference_answer: &str, transcript: &str) -> String {
    fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("question", question),
            ("user_answer", transcript),
            ("correct_answer", reference_answer),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

pub async fn evaluate_answer(
    ai: &dyn AiService,
    question: &str,
    reference_answer: &str,
    transcript: &str,
) -> Evaluation {
    match try_evaluate(ai, question, reference_answer, transcript).await {
        Ok(evaluation) => {
            info!("Answer rated {}/10", evaluation.rating);
            evaluation
        }
        Err(e) => {
            warn!("Answer evaluation fell back to default: {e}");
            Evaluation::fallback()
        }
    }
}

async fn try_evaluate(
    ai: &dyn AiService,
    question: &str,
    reference_answer: &str,
    transcript: &str,
) -> Result<Evaluation, EvaluationError> {
    let prompt = build_evaluation_prompt(question, reference_answer, transcript);
    let raw = ai.send_prompt(&prompt).await?;
    let value = extract_json_collapsing_newlines(&raw, JsonShape::Object)?;
    Ok(validate_evaluation(&value)?)
}
