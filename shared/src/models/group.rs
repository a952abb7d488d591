//! Group Model

use super::user::Role;
use serde::{Deserialize, Serialize};

/// Minimum number of days between quizzes a group may configure
pub const MIN_ALERT_FREQUENCY_DAYS: f64 = 0.5;

/// Minimum group password length
pub const MIN_GROUP_PASSWORD_LEN: usize = 8;

/// Family group entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Group {
    pub id: i64,
    /// Human-readable 8-character join code
    pub group_code: String,
    pub group_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub alert_frequency_days: f64,
    pub created_at: i64,
}

/// Membership row joined with the member's user record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GroupMember {
    pub group_id: i64,
    pub user_id: i64,
    pub is_owner: bool,
    pub display_name: String,
    pub line_id: String,
    pub role: Option<Role>,
}

/// Insert payload for a new group (password already hashed)
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub group_code: String,
    pub group_name: String,
    pub password_hash: String,
    pub alert_frequency_days: f64,
}

/// `POST /groups` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreate {
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub alert_frequency_days: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreated {
    pub id: i64,
    /// The join code
    pub group_id: String,
    pub group_name: String,
}

/// `POST /groups/join` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupJoin {
    /// The join code
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupJoined {
    pub group_id: i64,
    pub group_name: String,
}

/// Per-member answer counters as read from storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MemberAnswerCount {
    pub user_id: i64,
    pub display_name: String,
    pub total_answers: i64,
    pub correct_answers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStat {
    pub user_id: i64,
    pub display_name: String,
    /// Correct answers over total answers, rounded to 2 decimals
    pub correct_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStats {
    pub members: Vec<MemberStat>,
}
