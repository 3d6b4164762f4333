//! Question-Set Generator — asks the AI service for the interview's question/answer pairs.
//!
//! Flow: build prompt from the form → send → sanitize (array) → schema check.
//! Any failure aborts with `AppError::Llm`; callers must not persist anything.

use tracing::info;

use crate::errors::AppError;
use crate::interview::prompts::QUESTION_SET_PROMPT_TEMPLATE;
use crate::interview::schema::{validate_question_set, QUESTION_COUNT};
use crate::interview::validation::InterviewForm;
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::sanitize::{extract_json, JsonShape};
use crate::llm_client::AiService;
use crate::models::interview::QuestionAnswer;

/// Embeds the form's metadata verbatim.
pub fn build_question_set_prompt(form: &InterviewForm) -> String {
    let count = QUESTION_COUNT.to_string();
    let experience = form.experience.to_string();
    fill_template(
        QUESTION_SET_PROMPT_TEMPLATE,
        &[
            ("count", count.as_str()),
            ("position", form.position.as_str()),
            ("description", form.description.as_str()),
            ("experience", experience.as_str()),
            ("tech_stack", form.tech_stack.as_str()),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

pub async fn generate_question_set(
    ai: &dyn AiService,
    form: &InterviewForm,
) -> Result<Vec<QuestionAnswer>, AppError> {
    let prompt = build_question_set_prompt(form);

    let raw = ai
        .send_prompt(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Question generation call failed: {e}")))?;

    let value = extract_json(&raw, JsonShape::Array)
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    let questions = validate_question_set(&value)
        .map_err(|e| AppError::Llm(format!("Question generation returned an invalid set: {e}")))?;

    info!(
        "Generated {} questions for position {:?}",
        questions.len(),
        form.position
    );
    Ok(questions)
}
