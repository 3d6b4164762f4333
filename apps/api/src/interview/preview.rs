//! Evaluations shown to the user before they confirm saving an answer.
//!
//! One slot per (user, interview, question index). A newer preview replaces the
//! older one, and saving consumes the slot, so the store stays bounded by the
//! number of unanswered questions users are looking at.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::interview::evaluator::Evaluation;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PreviewKey {
    user_id: String,
    interview_id: Uuid,
    question_index: usize,
}

impl PreviewKey {
    fn new(user_id: &str, interview_id: Uuid, question_index: usize) -> Self {
        Self {
            user_id: user_id.to_string(),
            interview_id,
            question_index,
        }
    }
}

#[derive(Debug, Clone)]
struct Preview {
    transcript: String,
    evaluation: Evaluation,
}

#[derive(Debug, Default)]
pub struct PreviewStore {
    slots: RwLock<HashMap<PreviewKey, Preview>>,
}

impl PreviewStore {
    pub async fn remember(
        &self,
        user_id: &str,
        interview_id: Uuid,
        question_index: usize,
        transcript: &str,
        evaluation: &Evaluation,
    ) {
        self.slots.write().await.insert(
            PreviewKey::new(user_id, interview_id, question_index),
            Preview {
                transcript: transcript.to_string(),
                evaluation: evaluation.clone(),
            },
        );
    }

    /// Empties the slot and returns its evaluation if it was made for exactly
    /// this transcript.
    pub async fn take(
        &self,
        user_id: &str,
        interview_id: Uuid,
        question_index: usize,
        transcript: &str,
    ) -> Option<Evaluation> {
        self.slots
            .write()
            .await
            .remove(&PreviewKey::new(user_id, interview_id, question_index))
            .filter(|preview| preview.transcript == transcript)
            .map(|preview| preview.evaluation)
    }

    /// Drops every preview for an interview whose questions changed or went away.
    pub async fn forget_interview(&self, interview_id: Uuid) {
        self.slots
            .write()
            .await
            .retain(|key, _| key.interview_id != interview_id);
    }
}
