//! Answer storage

use async_trait::async_trait;
use shared::models::{Answer, NewAnswer};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::{AnswerRepository, RepoResult};

const ANSWER_COLUMNS: &str =
    "id, quiz_id, family_member_id, selected_option_id, is_correct, message, created_at";

pub struct PgAnswerRepository {
    pool: PgPool,
}

impl PgAnswerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerRepository for PgAnswerRepository {
    async fn find(&self, quiz_id: i64, user_id: i64) -> RepoResult<Option<Answer>> {
        let answer = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE quiz_id = $1 AND family_member_id = $2"
        ))
        .bind(quiz_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(answer)
    }

    async fn create(&self, data: NewAnswer) -> RepoResult<Answer> {
        // (quiz_id, family_member_id) is unique; a racing duplicate surfaces
        // as RepoError::Duplicate
        let answer = sqlx::query_as::<_, Answer>(&format!(
            "INSERT INTO answers (id, quiz_id, family_member_id, selected_option_id, is_correct, message, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(snowflake_id())
        .bind(data.quiz_id)
        .bind(data.family_member_id)
        .bind(data.selected_option_id)
        .bind(data.is_correct)
        .bind(&data.message)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(answer)
    }
}
