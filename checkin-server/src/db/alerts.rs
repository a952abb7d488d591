//! Alert history storage

use async_trait::async_trait;
use shared::models::{AlertHistory, AlertKind};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::{AlertRepository, RepoResult};

const ALERT_COLUMNS: &str = "id, group_id, kind, triggered_by, created_at";

pub struct PgAlertRepository {
    pool: PgPool,
}

impl PgAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for PgAlertRepository {
    async fn latest(&self, group_id: i64, kind: AlertKind) -> RepoResult<Option<AlertHistory>> {
        let alert = sqlx::query_as::<_, AlertHistory>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alert_histories \
             WHERE group_id = $1 AND kind = $2 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(group_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(alert)
    }

    async fn create(
        &self,
        group_id: i64,
        kind: AlertKind,
        triggered_by: Option<i64>,
    ) -> RepoResult<AlertHistory> {
        let alert = sqlx::query_as::<_, AlertHistory>(&format!(
            "INSERT INTO alert_histories (id, group_id, kind, triggered_by, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ALERT_COLUMNS}"
        ))
        .bind(snowflake_id())
        .bind(group_id)
        .bind(kind)
        .bind(triggered_by)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(alert)
    }
}
