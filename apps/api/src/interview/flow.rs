//! Interview flow: sequences validation, AI calls and store writes.
//!
//! Generation failures abort the operation. Scoring failures degrade to a
//! zero rating. A second answer to the same question is rejected outright.
//! Lifecycle phases are enforced by [`PhaseTable`], and the score a user
//! previewed is the one saved when they confirm the same transcript.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluator::{evaluate_answer, Evaluation};
use crate::interview::generator::generate_question_set;
use crate::interview::phase::{InterviewPhase, PhaseTable};
use crate::interview::preview::PreviewStore;
use crate::interview::validation::{require_user_id, validate_transcript, InterviewForm};
use crate::llm_client::AiService;
use crate::models::answer::UserAnswer;
use crate::models::interview::{Interview, QuestionAnswer};
use crate::store::{InterviewSubscription, RecordStore};

/// A transcript for one stored question, as previewed or submitted.
#[derive(Debug, Clone, Copy)]
pub struct AnswerSubmission<'a> {
    pub interview_id: Uuid,
    pub user_id: &'a str,
    pub question_index: usize,
    pub transcript: &'a str,
}

#[derive(Clone)]
pub struct InterviewFlow {
    ai: Arc<dyn AiService>,
    store: Arc<dyn RecordStore>,
    phases: Arc<PhaseTable>,
    previews: Arc<PreviewStore>,
}

impl InterviewFlow {
    pub fn new(ai: Arc<dyn AiService>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            ai,
            store,
            phases: Arc::new(PhaseTable::default()),
            previews: Arc::new(PreviewStore::default()),
        }
    }

    pub async fn create_interview(
        &self,
        user_id: &str,
        form: &InterviewForm,
    ) -> Result<Interview, AppError> {
        require_user_id(user_id)?;
        form.validate()?;
        let form = form.normalized();

        let id = Uuid::new_v4();
        let generating = self
            .phases
            .enter(id, InterviewPhase::Draft, InterviewPhase::Generating)?;

        let questions = generate_question_set(self.ai.as_ref(), &form).await?;

        let interview = Interview {
            id,
            user_id: user_id.to_string(),
            position: form.position,
            description: form.description,
            experience: form.experience,
            tech_stack: form.tech_stack,
            questions,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.store.create_interview(&interview).await?;
        generating.settle(InterviewPhase::Saved)?;

        info!("Created interview {id} for user {user_id}");
        Ok(interview)
    }

    /// Edits metadata and regenerates the whole question set.
    pub async fn update_interview(
        &self,
        id: Uuid,
        user_id: &str,
        form: &InterviewForm,
    ) -> Result<Interview, AppError> {
        require_user_id(user_id)?;
        form.validate()?;
        let form = form.normalized();

        let existing = self.owned_interview(id, user_id).await?;
        let generating = self
            .phases
            .enter(id, InterviewPhase::Saved, InterviewPhase::Generating)?;

        let questions = generate_question_set(self.ai.as_ref(), &form).await?;

        let updated = Interview {
            position: form.position,
            description: form.description,
            experience: form.experience,
            tech_stack: form.tech_stack,
            questions,
            updated_at: Some(Utc::now()),
            ..existing
        };

        if !self.store.update_interview(&updated).await? {
            return Err(AppError::NotFound(format!("Interview {id} not found")));
        }
        generating.settle(InterviewPhase::Saved)?;
        self.previews.forget_interview(id).await;

        info!("Updated interview {id} for user {user_id}");
        Ok(updated)
    }

    pub async fn delete_interview(&self, id: Uuid, user_id: &str) -> Result<(), AppError> {
        require_user_id(user_id)?;
        self.owned_interview(id, user_id).await?;
        let deleting = self
            .phases
            .enter(id, InterviewPhase::Saved, InterviewPhase::Deleted)?;

        self.store
            .delete_interview(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;
        deleting.settle(InterviewPhase::Deleted)?;
        self.previews.forget_interview(id).await;

        info!("Deleted interview {id} for user {user_id}");
        Ok(())
    }

    pub async fn get_interview(&self, id: Uuid) -> Result<Interview, AppError> {
        self.store
            .get_interview(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
    }

    pub async fn list_interviews(&self, user_id: &str) -> Result<Vec<Interview>, AppError> {
        require_user_id(user_id)?;
        self.store.list_interviews(user_id).await
    }

    /// Live view of the user's interviews. Drop the handle to stop listening.
    pub fn subscribe_interviews(&self, user_id: &str) -> Result<InterviewSubscription, AppError> {
        require_user_id(user_id)?;
        Ok(InterviewSubscription::open(self.store.clone(), user_id))
    }

    /// Scores a transcript without saving it. The result is kept so that
    /// submitting the same transcript saves this score without a second AI call.
    pub async fn preview_evaluation(
        &self,
        submission: AnswerSubmission<'_>,
    ) -> Result<Evaluation, AppError> {
        let AnswerSubmission {
            interview_id,
            user_id,
            question_index,
            transcript,
        } = submission;

        require_user_id(user_id)?;
        validate_transcript(transcript)?;
        let pair = self.answerable_question(interview_id, question_index).await?;

        let transcript = transcript.trim();
        let evaluation =
            evaluate_answer(self.ai.as_ref(), &pair.question, &pair.answer, transcript).await;
        self.previews
            .remember(user_id, interview_id, question_index, transcript, &evaluation)
            .await;
        Ok(evaluation)
    }

    /// Stores the transcript as the user's answer to that question, with the
    /// previewed score when there is one for this exact transcript.
    /// Each (user, interview, question) can be answered once.
    pub async fn submit_answer(
        &self,
        submission: AnswerSubmission<'_>,
    ) -> Result<UserAnswer, AppError> {
        let AnswerSubmission {
            interview_id,
            user_id,
            question_index,
            transcript,
        } = submission;

        require_user_id(user_id)?;
        validate_transcript(transcript)?;
        let pair = self.answerable_question(interview_id, question_index).await?;

        if self
            .store
            .find_answer(user_id, interview_id, &pair.question)
            .await?
            .is_some()
        {
            info!("User {user_id} already answered question {question_index} of {interview_id}");
            return Err(AppError::AlreadyAnswered(
                "You have already answered this question".to_string(),
            ));
        }

        let transcript = transcript.trim();
        let evaluation = match self
            .previews
            .take(user_id, interview_id, question_index, transcript)
            .await
        {
            Some(previewed) => {
                debug!(
                    "Reusing previewed evaluation for question {question_index} of {interview_id}"
                );
                previewed
            }
            None => {
                evaluate_answer(self.ai.as_ref(), &pair.question, &pair.answer, transcript).await
            }
        };

        let now = Utc::now();
        let answer = UserAnswer {
            id: Uuid::new_v4(),
            interview_id,
            question: pair.question,
            correct_answer: pair.answer,
            user_answer: transcript.to_string(),
            rating: evaluation.rating,
            feedback: evaluation.feedback,
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.create_answer(&answer).await?;

        info!(
            "Saved answer {} for question {question_index} of {interview_id}",
            answer.id
        );
        Ok(answer)
    }

    pub async fn list_answers(
        &self,
        interview_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<UserAnswer>, AppError> {
        require_user_id(user_id)?;
        self.store.list_answers(user_id, interview_id).await
    }

    async fn owned_interview(&self, id: Uuid, user_id: &str) -> Result<Interview, AppError> {
        let interview = self.get_interview(id).await?;
        if interview.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(interview)
    }

    /// The stored question at `index`, unless the interview is being regenerated or removed.
    async fn answerable_question(
        &self,
        interview_id: Uuid,
        index: usize,
    ) -> Result<QuestionAnswer, AppError> {
        let interview = self.get_interview(interview_id).await?;
        if let Some(phase) = self.phases.in_flight(interview_id) {
            return Err(AppError::Conflict(format!(
                "Interview {interview_id} is {phase:?}; answer once it is saved"
            )));
        }
        interview.question(index).cloned().ok_or_else(|| {
            AppError::NotFound(format!(
                "Question {index} not found in interview {interview_id}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fake::{five_questions_reply, ScriptedAi};
    use crate::store::memory::MemoryRecordStore;

    const USER: &str = "user_2abc";
    const GOOD_TRANSCRIPT: &str = "I would put the API behind a load balancer and cache reads.";

    fn form() -> InterviewForm {
        InterviewForm {
            position: "Backend Engineer".to_string(),
            description: "Build APIs".to_string(),
            experience: 3.0,
            tech_stack: "Go,Postgres".to_string(),
        }
    }

    fn flow_with(ai: ScriptedAi) -> (InterviewFlow, Arc<ScriptedAi>, Arc<MemoryRecordStore>) {
        let ai = Arc::new(ai);
        let store = Arc::new(MemoryRecordStore::new());
        (InterviewFlow::new(ai.clone(), store.clone()), ai, store)
    }

    fn submission(interview_id: Uuid, transcript: &str) -> AnswerSubmission<'_> {
        AnswerSubmission {
            interview_id,
            user_id: USER,
            question_index: 0,
            transcript,
        }
    }

    #[tokio::test]
    async fn test_create_stores_generated_questions() {
        let (flow, ai, store) = flow_with(ScriptedAi::new().reply(five_questions_reply()));

        let interview = flow.create_interview(USER, &form()).await.unwrap();
        assert_eq!(interview.questions.len(), 5);
        assert!(interview.updated_at.is_none());

        let stored = store.get_interview(interview.id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, USER);
        assert_eq!(stored.questions, interview.questions);
        assert!(ai.prompts()[0].contains("Tech Stacks: Go,Postgres"));
    }

    #[tokio::test]
    async fn test_failed_generation_writes_nothing() {
        let (flow, _ai, store) = flow_with(ScriptedAi::new().reply("Sorry, I can't do that."));

        let result = flow.create_interview(USER, &form()).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        assert!(store.list_interviews(USER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_ai() {
        let (flow, ai, _store) = flow_with(ScriptedAi::new().reply(five_questions_reply()));
        let bad = InterviewForm {
            description: "short".to_string(),
            ..form()
        };

        let result = flow.create_interview(USER, &bad).await;
        assert!(matches!(result, Err(AppError::InvalidForm(_))));
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_regenerates_questions() {
        let replacement = five_questions_reply().replace("Question", "Revised question");
        let (flow, _ai, store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(replacement),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let edited = InterviewForm {
            position: "Staff Backend Engineer".to_string(),
            ..form()
        };
        let updated = flow
            .update_interview(created.id, USER, &edited)
            .await
            .unwrap();

        assert_eq!(updated.position, "Staff Backend Engineer");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
        assert!(updated.questions[0].question.starts_with("Revised question"));

        let stored = store.get_interview(created.id).await.unwrap().unwrap();
        assert_eq!(stored.questions, updated.questions);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_questions() {
        let (flow, _ai, store) =
            flow_with(ScriptedAi::new().reply(five_questions_reply()).fail(503));
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let result = flow.update_interview(created.id, USER, &form()).await;
        assert!(matches!(result, Err(AppError::Llm(_))));

        let stored = store.get_interview(created.id).await.unwrap().unwrap();
        assert_eq!(stored.questions, created.questions);
        assert!(stored.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_only_owner_can_update_or_delete() {
        let (flow, ai, _store) = flow_with(ScriptedAi::new().reply(five_questions_reply()));
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let update = flow.update_interview(created.id, "someone_else", &form()).await;
        assert!(matches!(update, Err(AppError::Forbidden)));
        let delete = flow.delete_interview(created.id, "someone_else").await;
        assert!(matches!(delete, Err(AppError::Forbidden)));
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_interview_and_answers() {
        let (flow, _ai, store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(r#"{"ratings": 7, "feedback": "Good"}"#),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();
        flow.submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();

        flow.delete_interview(created.id, USER).await.unwrap();

        assert!(store.get_interview(created.id).await.unwrap().is_none());
        assert!(store.list_answers(USER, created.id).await.unwrap().is_empty());
        let again = flow.delete_interview(created.id, USER).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_answer_saves_rating_and_feedback() {
        let (flow, _ai, store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(r#"{"ratings": 8, "feedback": "Covers caching well"}"#),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let answer = flow
            .submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();

        assert_eq!(answer.rating, 8);
        assert_eq!(answer.feedback, "Covers caching well");
        assert_eq!(answer.question, created.questions[0].question);
        assert_eq!(answer.correct_answer, created.questions[0].answer);
        assert_eq!(store.list_answers(USER, created.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_short_transcript_blocks_evaluation() {
        let (flow, ai, store) = flow_with(ScriptedAi::new().reply(five_questions_reply()));
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let result = flow
            .submit_answer(submission(created.id, "Use a cache."))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(ai.call_count(), 1, "evaluator must not be called");
        assert!(store.list_answers(USER, created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_answer_to_same_question_is_rejected() {
        let (flow, ai, store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(r#"{"ratings": 6, "feedback": "Decent"}"#),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();
        let first = flow
            .submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();

        let second = flow
            .submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await;

        assert!(matches!(second, Err(AppError::AlreadyAnswered(_))));
        assert_eq!(ai.call_count(), 2, "duplicate must not reach the evaluator");
        let answers = store.list_answers(USER, created.id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].id, first.id);
    }

    #[tokio::test]
    async fn test_evaluator_failure_still_saves_fallback() {
        let (flow, _ai, _store) =
            flow_with(ScriptedAi::new().reply(five_questions_reply()).fail(500));
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let answer = flow
            .submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();

        assert_eq!(answer.rating, 0);
        assert_eq!(answer.feedback, "Unable to generate feedback");
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let (flow, _ai, store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(r#"{"ratings": 9, "feedback": "Excellent"}"#),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let evaluation = flow
            .preview_evaluation(AnswerSubmission {
                question_index: 2,
                ..submission(created.id, GOOD_TRANSCRIPT)
            })
            .await
            .unwrap();

        assert_eq!(evaluation.rating, 9);
        assert!(store.list_answers(USER, created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_after_preview_saves_previewed_score() {
        let (flow, ai, store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(r#"{"ratings": 9, "feedback": "Previewed"}"#)
                .reply(r#"{"ratings": 3, "feedback": "Different"}"#),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let preview = flow
            .preview_evaluation(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();
        let saved = flow
            .submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();

        assert_eq!((saved.rating, saved.feedback.as_str()), (9, "Previewed"));
        assert_eq!(preview.rating, saved.rating);
        assert_eq!(ai.call_count(), 2, "one generation call and one evaluation call");
        let stored = store.list_answers(USER, created.id).await.unwrap();
        assert_eq!(stored[0].rating, 9);
    }

    #[tokio::test]
    async fn test_edited_transcript_is_scored_again() {
        let (flow, ai, _store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(r#"{"ratings": 9, "feedback": "Previewed"}"#)
                .reply(r#"{"ratings": 3, "feedback": "Different"}"#),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();
        flow.preview_evaluation(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();

        let edited = format!("{GOOD_TRANSCRIPT} Then I would add rate limiting.");
        let saved = flow
            .submit_answer(submission(created.id, &edited))
            .await
            .unwrap();

        assert_eq!(saved.rating, 3);
        assert_eq!(ai.call_count(), 3);
    }

    #[tokio::test]
    async fn test_regenerated_questions_discard_previews() {
        let (flow, ai, _store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .reply(r#"{"ratings": 9, "feedback": "Previewed"}"#)
                .reply(five_questions_reply().replace("Question", "Revised question"))
                .reply(r#"{"ratings": 4, "feedback": "Scored against the new question"}"#),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();
        flow.preview_evaluation(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();
        flow.update_interview(created.id, USER, &form())
            .await
            .unwrap();

        let saved = flow
            .submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await
            .unwrap();

        assert_eq!(saved.rating, 4);
        assert!(saved.question.starts_with("Revised question"));
        assert_eq!(ai.call_count(), 4);
    }

    #[tokio::test]
    async fn test_failed_update_releases_interview_for_next_edit() {
        let (flow, _ai, _store) = flow_with(
            ScriptedAi::new()
                .reply(five_questions_reply())
                .fail(503)
                .reply(five_questions_reply()),
        );
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let failed = flow.update_interview(created.id, USER, &form()).await;
        assert!(matches!(failed, Err(AppError::Llm(_))));
        assert_eq!(flow.phases.in_flight(created.id), None);

        assert!(flow.update_interview(created.id, USER, &form()).await.is_ok());
    }

    #[tokio::test]
    async fn test_interview_being_regenerated_rejects_answers_and_edits() {
        let (flow, ai, _store) = flow_with(ScriptedAi::new().reply(five_questions_reply()));
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let _regenerating = flow
            .phases
            .enter(created.id, InterviewPhase::Saved, InterviewPhase::Generating)
            .unwrap();

        let answer = flow
            .submit_answer(submission(created.id, GOOD_TRANSCRIPT))
            .await;
        assert!(matches!(answer, Err(AppError::Conflict(_))));
        let edit = flow.update_interview(created.id, USER, &form()).await;
        assert!(matches!(edit, Err(AppError::Conflict(_))));
        let delete = flow.delete_interview(created.id, USER).await;
        assert!(matches!(delete, Err(AppError::Conflict(_))));
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_question_index_is_not_found() {
        let (flow, _ai, _store) = flow_with(ScriptedAi::new().reply(five_questions_reply()));
        let created = flow.create_interview(USER, &form()).await.unwrap();

        let result = flow
            .submit_answer(AnswerSubmission {
                question_index: 5,
                ..submission(created.id, GOOD_TRANSCRIPT)
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
