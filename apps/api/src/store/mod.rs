//! Record store — the document collections behind interviews, answers and users.
//!
//! Flow code talks to `Arc<dyn RecordStore>` only. Every successful write
//! publishes a `ChangeEvent` so live queries can refresh.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::answer::UserAnswer;
use crate::models::interview::Interview;
use crate::models::user::UserProfile;

pub mod memory;
pub mod postgres;
pub mod subscription;

pub use subscription::{ChangeEvent, ChangeFeed, Collection, InterviewSubscription};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_interview(&self, interview: &Interview) -> Result<(), AppError>;

    /// Replaces the stored interview. Returns `false` if it no longer exists.
    async fn update_interview(&self, interview: &Interview) -> Result<bool, AppError>;

    /// Deletes the interview and its answers, returning what was removed.
    async fn delete_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError>;

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError>;

    /// All interviews owned by `user_id`, newest first.
    async fn list_interviews(&self, user_id: &str) -> Result<Vec<Interview>, AppError>;

    async fn find_answer(
        &self,
        user_id: &str,
        interview_id: Uuid,
        question: &str,
    ) -> Result<Option<UserAnswer>, AppError>;

    /// Fails with `AppError::AlreadyAnswered` if (user, interview, question) exists.
    async fn create_answer(&self, answer: &UserAnswer) -> Result<(), AppError>;

    /// Answers for one interview, oldest first.
    async fn list_answers(
        &self,
        user_id: &str,
        interview_id: Uuid,
    ) -> Result<Vec<UserAnswer>, AppError>;

    async fn get_user(&self, id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Inserts the profile unless one with the same id exists. Returns whether it inserted.
    async fn create_user(&self, profile: &UserProfile) -> Result<bool, AppError>;

    fn changes(&self) -> &ChangeFeed;
}
