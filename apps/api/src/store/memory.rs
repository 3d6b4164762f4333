use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::answer::UserAnswer;
use crate::models::interview::Interview;
use crate::models::user::UserProfile;
use crate::store::{ChangeEvent, ChangeFeed, Collection, RecordStore};

/// Process-local record store. Used when no `DATABASE_URL` is configured, and by tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    interviews: RwLock<HashMap<Uuid, Interview>>,
    answers: RwLock<Vec<UserAnswer>>,
    users: RwLock<HashMap<String, UserProfile>>,
    feed: ChangeFeed,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_interview(&self, interview: &Interview) -> Result<(), AppError> {
        self.interviews
            .write()
            .await
            .insert(interview.id, interview.clone());
        self.feed
            .publish(ChangeEvent::new(Collection::Interview, &interview.user_id));
        Ok(())
    }

    async fn update_interview(&self, interview: &Interview) -> Result<bool, AppError> {
        let mut interviews = self.interviews.write().await;
        let Some(existing) = interviews.get_mut(&interview.id) else {
            return Ok(false);
        };
        *existing = interview.clone();
        drop(interviews);
        self.feed
            .publish(ChangeEvent::new(Collection::Interview, &interview.user_id));
        Ok(true)
    }

    async fn delete_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError> {
        let removed = self.interviews.write().await.remove(&id);
        if let Some(interview) = &removed {
            self.answers.write().await.retain(|a| a.interview_id != id);
            self.feed
                .publish(ChangeEvent::new(Collection::Interview, &interview.user_id));
        }
        Ok(removed)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError> {
        Ok(self.interviews.read().await.get(&id).cloned())
    }

    async fn list_interviews(&self, user_id: &str) -> Result<Vec<Interview>, AppError> {
        let mut list: Vec<Interview> = self
            .interviews
            .read()
            .await
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn find_answer(
        &self,
        user_id: &str,
        interview_id: Uuid,
        question: &str,
    ) -> Result<Option<UserAnswer>, AppError> {
        Ok(self
            .answers
            .read()
            .await
            .iter()
            .find(|a| {
                a.user_id == user_id && a.interview_id == interview_id && a.question == question
            })
            .cloned())
    }

    async fn create_answer(&self, answer: &UserAnswer) -> Result<(), AppError> {
        let mut answers = self.answers.write().await;
        let duplicate = answers.iter().any(|a| {
            a.user_id == answer.user_id
                && a.interview_id == answer.interview_id
                && a.question == answer.question
        });
        if duplicate {
            return Err(AppError::AlreadyAnswered(
                "You have already answered this question".to_string(),
            ));
        }
        answers.push(answer.clone());
        drop(answers);
        self.feed
            .publish(ChangeEvent::new(Collection::UserAnswers, &answer.user_id));
        Ok(())
    }

    async fn list_answers(
        &self,
        user_id: &str,
        interview_id: Uuid,
    ) -> Result<Vec<UserAnswer>, AppError> {
        let mut list: Vec<UserAnswer> = self
            .answers
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.interview_id == interview_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn create_user(&self, profile: &UserProfile) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        if users.contains_key(&profile.id) {
            return Ok(false);
        }
        users.insert(profile.id.clone(), profile.clone());
        drop(users);
        self.feed
            .publish(ChangeEvent::new(Collection::Users, &profile.id));
        Ok(true)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}
