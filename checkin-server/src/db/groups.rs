//! Group and membership storage

use async_trait::async_trait;
use shared::models::{Group, GroupMember, MemberAnswerCount, NewGroup};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::{GroupRepository, RepoResult};

const GROUP_COLUMNS: &str =
    "id, group_code, group_name, password_hash, alert_frequency_days, created_at";

const MEMBER_SELECT: &str = "SELECT m.group_id, m.user_id, m.is_owner, u.display_name, u.line_id, u.role \
     FROM group_members m JOIN users u ON u.id = m.user_id";

pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn code_exists(&self, group_code: &str) -> RepoResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM family_groups WHERE group_code = $1)")
                .bind(group_code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_with_owner(&self, data: NewGroup, owner_id: i64) -> RepoResult<Group> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(&format!(
            "INSERT INTO family_groups (id, group_code, group_name, password_hash, alert_frequency_days, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {GROUP_COLUMNS}"
        ))
        .bind(snowflake_id())
        .bind(&data.group_code)
        .bind(&data.group_name)
        .bind(&data.password_hash)
        .bind(data.alert_frequency_days)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO group_members (group_id, user_id, is_owner, created_at) VALUES ($1, $2, TRUE, $3)",
        )
        .bind(group.id)
        .bind(owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(group)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM family_groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn find_by_code(&self, group_code: &str) -> RepoResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM family_groups WHERE group_code = $1"
        ))
        .bind(group_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn list_all(&self) -> RepoResult<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM family_groups ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    async fn find_membership(&self, user_id: i64) -> RepoResult<Option<GroupMember>> {
        let member =
            sqlx::query_as::<_, GroupMember>(&format!("{MEMBER_SELECT} WHERE m.user_id = $1"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(member)
    }

    async fn add_member(&self, group_id: i64, user_id: i64) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO group_members (group_id, user_id, is_owner, created_at) VALUES ($1, $2, FALSE, $3)",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_members(&self, group_id: i64) -> RepoResult<Vec<GroupMember>> {
        let members = sqlx::query_as::<_, GroupMember>(&format!(
            "{MEMBER_SELECT} WHERE m.group_id = $1 ORDER BY m.created_at"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn member_answer_counts(&self, group_id: i64) -> RepoResult<Vec<MemberAnswerCount>> {
        let rows = sqlx::query_as::<_, MemberAnswerCount>(
            "SELECT u.id AS user_id, u.display_name, \
                    COUNT(a.id) AS total_answers, \
                    COUNT(a.id) FILTER (WHERE a.is_correct) AS correct_answers \
             FROM group_members m \
             JOIN users u ON u.id = m.user_id \
             LEFT JOIN answers a ON a.family_member_id = u.id \
             WHERE m.group_id = $1 \
             GROUP BY u.id, u.display_name, m.created_at \
             ORDER BY m.created_at",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
