//! User storage

use async_trait::async_trait;
use shared::models::{Role, User, UserCreate};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::{RepoError, RepoResult, UserRepository};

const USER_COLUMNS: &str = "id, line_id, display_name, role, points, created_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_line_id(&self, line_id: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE line_id = $1"
        ))
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, data: UserCreate) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, line_id, display_name, points, created_at) \
             VALUES ($1, $2, $3, 0, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(snowflake_id())
        .bind(&data.line_id)
        .bind(&data.display_name)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: i64, display_name: &str, role: Role) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET display_name = $2, role = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(display_name)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("user {id}")))
    }

    async fn add_points(&self, id: i64, delta: i32) -> RepoResult<i32> {
        let points: Option<i32> = sqlx::query_scalar(
            "UPDATE users SET points = points + $2 WHERE id = $1 RETURNING points",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        points.ok_or_else(|| RepoError::NotFound(format!("user {id}")))
    }

    async fn try_spend_points(&self, id: i64, amount: i32) -> RepoResult<Option<i32>> {
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE users SET points = points - $2 WHERE id = $1 AND points >= $2 RETURNING points",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;
        Ok(remaining)
    }
}
