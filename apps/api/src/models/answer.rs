use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's recorded answer to one interview question, with its AI score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub question: String,
    pub correct_answer: String,
    pub user_answer: String,
    /// 1–10, or 0 when scoring fell back.
    pub rating: u8,
    pub feedback: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserAnswerRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub question: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub rating: i16,
    pub feedback: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAnswerRow> for UserAnswer {
    fn from(row: UserAnswerRow) -> Self {
        Self {
            id: row.id,
            interview_id: row.interview_id,
            question: row.question,
            correct_answer: row.correct_answer,
            user_answer: row.user_answer,
            rating: row.rating.clamp(0, 10) as u8,
            feedback: row.feedback,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
