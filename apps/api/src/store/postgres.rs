use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::answer::{UserAnswer, UserAnswerRow};
use crate::models::interview::{Interview, InterviewRow};
use crate::models::user::UserProfile;
use crate::store::{ChangeEvent, ChangeFeed, Collection, RecordStore};

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Record store backed by PostgreSQL. The change feed is process-local, so live
/// queries see writes made through this instance.
pub struct PgRecordStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::default(),
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create_interview(&self, interview: &Interview) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO interviews
                (id, user_id, position, description, experience, tech_stack, questions, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(interview.id)
        .bind(&interview.user_id)
        .bind(&interview.position)
        .bind(&interview.description)
        .bind(interview.experience)
        .bind(&interview.tech_stack)
        .bind(Json(&interview.questions))
        .bind(interview.created_at)
        .bind(interview.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Inserted interview {} for user {}", interview.id, interview.user_id);
        self.feed
            .publish(ChangeEvent::new(Collection::Interview, &interview.user_id));
        Ok(())
    }

    async fn update_interview(&self, interview: &Interview) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE interviews
            SET position = $2, description = $3, experience = $4, tech_stack = $5,
                questions = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(interview.id)
        .bind(&interview.position)
        .bind(&interview.description)
        .bind(interview.experience)
        .bind(&interview.tech_stack)
        .bind(Json(&interview.questions))
        .bind(interview.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        self.feed
            .publish(ChangeEvent::new(Collection::Interview, &interview.user_id));
        Ok(true)
    }

    async fn delete_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError> {
        // user_answers rows go with it (ON DELETE CASCADE)
        let removed: Option<InterviewRow> =
            sqlx::query_as("DELETE FROM interviews WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let removed = removed.map(Interview::from);
        if let Some(interview) = &removed {
            info!("Deleted interview {} for user {}", interview.id, interview.user_id);
            self.feed
                .publish(ChangeEvent::new(Collection::Interview, &interview.user_id));
        }
        Ok(removed)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError> {
        let row: Option<InterviewRow> = sqlx::query_as("SELECT * FROM interviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Interview::from))
    }

    async fn list_interviews(&self, user_id: &str) -> Result<Vec<Interview>, AppError> {
        let rows: Vec<InterviewRow> = sqlx::query_as(
            "SELECT * FROM interviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Interview::from).collect())
    }

    async fn find_answer(
        &self,
        user_id: &str,
        interview_id: Uuid,
        question: &str,
    ) -> Result<Option<UserAnswer>, AppError> {
        let row: Option<UserAnswerRow> = sqlx::query_as(
            r#"
            SELECT * FROM user_answers
            WHERE user_id = $1 AND interview_id = $2 AND question = $3
            "#,
        )
        .bind(user_id)
        .bind(interview_id)
        .bind(question)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserAnswer::from))
    }

    async fn create_answer(&self, answer: &UserAnswer) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_answers
                (id, interview_id, question, correct_answer, user_answer,
                 rating, feedback, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(answer.id)
        .bind(answer.interview_id)
        .bind(&answer.question)
        .bind(&answer.correct_answer)
        .bind(&answer.user_answer)
        .bind(i16::from(answer.rating))
        .bind(&answer.feedback)
        .bind(&answer.user_id)
        .bind(answer.created_at)
        .bind(answer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyAnswered("You have already answered this question".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        info!(
            "Saved answer {} for interview {} (rating {})",
            answer.id, answer.interview_id, answer.rating
        );
        self.feed
            .publish(ChangeEvent::new(Collection::UserAnswers, &answer.user_id));
        Ok(())
    }

    async fn list_answers(
        &self,
        user_id: &str,
        interview_id: Uuid,
    ) -> Result<Vec<UserAnswer>, AppError> {
        let rows: Vec<UserAnswerRow> = sqlx::query_as(
            r#"
            SELECT * FROM user_answers
            WHERE user_id = $1 AND interview_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserAnswer::from).collect())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, profile: &UserProfile) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.image_url)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            info!("Created user profile {}", profile.id);
            self.feed
                .publish(ChangeEvent::new(Collection::Users, &profile.id));
        }
        Ok(inserted)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}
