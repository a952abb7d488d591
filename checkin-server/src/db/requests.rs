//! Quiz request storage

use async_trait::async_trait;
use shared::models::{NewQuizRequest, PendingRequest, QuizRequest, RequestType};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::{RepoResult, RequestRepository};

const REQUEST_COLUMNS: &str =
    "id, user_id, group_id, request_type, content, is_handled, handled_quiz_id, created_at";

pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepository for PgRequestRepository {
    async fn create(&self, data: NewQuizRequest) -> RepoResult<QuizRequest> {
        let request = sqlx::query_as::<_, QuizRequest>(&format!(
            "INSERT INTO quiz_requests (id, user_id, group_id, request_type, content, is_handled, created_at) \
             VALUES ($1, $2, $3, $4, $5, FALSE, $6) RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(snowflake_id())
        .bind(data.user_id)
        .bind(data.group_id)
        .bind(data.request_type)
        .bind(&data.content)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    async fn oldest_unhandled_quiz_request(
        &self,
        group_id: i64,
    ) -> RepoResult<Option<QuizRequest>> {
        let request = sqlx::query_as::<_, QuizRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM quiz_requests \
             WHERE group_id = $1 AND request_type = $2 AND NOT is_handled \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(group_id)
        .bind(RequestType::Quiz)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn mark_handled(&self, request_id: i64, quiz_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE quiz_requests SET is_handled = TRUE, handled_quiz_id = $2 WHERE id = $1 AND NOT is_handled",
        )
        .bind(request_id)
        .bind(quiz_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pending_quiz_requests(&self, group_id: i64) -> RepoResult<Vec<PendingRequest>> {
        let requests = sqlx::query_as::<_, PendingRequest>(
            "SELECT r.id AS request_id, r.content, u.display_name AS requester_name, r.created_at \
             FROM quiz_requests r JOIN users u ON u.id = r.user_id \
             WHERE r.group_id = $1 AND r.request_type = $2 AND NOT r.is_handled \
             ORDER BY r.created_at, r.id",
        )
        .bind(group_id)
        .bind(RequestType::Quiz)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }
}
