//! Axum route handlers for the Interview API.

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluator::Evaluation;
use crate::interview::flow::AnswerSubmission;
use crate::interview::validation::InterviewForm;
use crate::models::answer::UserAnswer;
use crate::models::interview::Interview;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub form: InterviewForm,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub user_id: String,
    pub question_index: usize,
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub user_id: String,
    pub question_index: usize,
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct InterviewListResponse {
    pub interviews: Vec<Interview>,
}

#[derive(Debug, Serialize)]
pub struct AnswerListResponse {
    pub answers: Vec<UserAnswer>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<InterviewListResponse>, AppError> {
    let interviews = state.flow.list_interviews(&params.user_id).await?;
    Ok(Json(InterviewListResponse { interviews }))
}

/// GET /api/v1/interviews/stream
///
/// Server-sent events: one `snapshot` event with the full list now, then one
/// after every change to the user's interviews.
pub async fn handle_interview_stream(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = state.flow.subscribe_interviews(&params.user_id)?;

    let events = subscription.into_stream().map(|snapshot| {
        let event = match snapshot {
            Ok(interviews) => Event::default()
                .event("snapshot")
                .json_data(&interviews)
                .unwrap_or_else(|e| {
                    error!("Failed to encode interview snapshot: {e}");
                    snapshot_error_event()
                }),
            Err(e) => {
                error!("Failed to read interview snapshot: {e}");
                snapshot_error_event()
            }
        };
        Ok(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn snapshot_error_event() -> Event {
    Event::default()
        .event("error")
        .data("Something went wrong... try again later")
}

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    Json(request): Json<InterviewRequest>,
) -> Result<(StatusCode, Json<Interview>), AppError> {
    let interview = state
        .flow
        .create_interview(&request.user_id, &request.form)
        .await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Interview>, AppError> {
    Ok(Json(state.flow.get_interview(id).await?))
}

/// PUT /api/v1/interviews/:id
///
/// Saves the edited metadata and regenerates every question.
pub async fn handle_update_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<Interview>, AppError> {
    let interview = state
        .flow
        .update_interview(id, &request.user_id, &request.form)
        .await?;
    Ok(Json(interview))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.flow.delete_interview(id, &params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/interviews/:id/evaluate
///
/// Scores a transcript without saving it, so the user can review before submitting.
/// Submitting the same transcript afterwards saves this score.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let evaluation = state
        .flow
        .preview_evaluation(AnswerSubmission {
            interview_id: id,
            user_id: &request.user_id,
            question_index: request.question_index,
            transcript: &request.transcript,
        })
        .await?;
    Ok(Json(evaluation))
}

/// POST /api/v1/interviews/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<(StatusCode, Json<UserAnswer>), AppError> {
    let answer = state
        .flow
        .submit_answer(AnswerSubmission {
            interview_id: id,
            user_id: &request.user_id,
            question_index: request.question_index,
            transcript: &request.transcript,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

/// GET /api/v1/interviews/:id/answers
pub async fn handle_list_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<AnswerListResponse>, AppError> {
    let answers = state.flow.list_answers(id, &params.user_id).await?;
    Ok(Json(AnswerListResponse { answers }))
}
