//! Alert History Model

use serde::{Deserialize, Serialize};

/// Kind of alert recorded in the history log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "alert_kind", rename_all = "snake_case"))]
pub enum AlertKind {
    /// Raised manually by a grandparent
    Emergency,
    /// No quiz posted within the group's alert frequency (family audience)
    NoQuiz,
    /// Nudge to the grandparent shortly before `NoQuiz` fires
    GrandparentQuizReminder,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Emergency => "emergency",
            AlertKind::NoQuiz => "no_quiz",
            AlertKind::GrandparentQuizReminder => "grandparent_quiz_reminder",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only alert log entry
///
/// Also the de-duplication marker for scheduled alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AlertHistory {
    pub id: i64,
    pub group_id: i64,
    pub kind: AlertKind,
    /// `None` for batch-originated alerts
    pub triggered_by: Option<i64>,
    pub created_at: i64,
}
