use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One generated question with its reference answer. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub user_id: String,
    pub position: String,
    pub description: String,
    pub experience: f64,
    /// Comma-separated, as entered.
    pub tech_stack: String,
    pub questions: Vec<QuestionAnswer>,
    pub created_at: DateTime<Utc>,
    /// Unset until the first edit.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Interview {
    pub fn question(&self, index: usize) -> Option<&QuestionAnswer> {
        self.questions.get(index)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub user_id: String,
    pub position: String,
    pub description: String,
    pub experience: f64,
    pub tech_stack: String,
    pub questions: Json<Vec<QuestionAnswer>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<InterviewRow> for Interview {
    fn from(row: InterviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            position: row.position,
            description: row.description,
            experience: row.experience,
            tech_stack: row.tech_stack,
            questions: row.questions.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
