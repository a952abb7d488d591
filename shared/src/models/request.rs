//! Quiz Request Model

use serde::{Deserialize, Serialize};

/// Points spent per request
pub const REQUEST_COST: i32 = 10;

/// What a family member is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "request_type", rename_all = "snake_case"))]
pub enum RequestType {
    /// A quiz theme; fulfilled by the next quiz posted in the group
    Quiz,
    /// Anything else; grandparents are notified immediately
    Other,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Quiz => "quiz",
            RequestType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quiz" => Some(RequestType::Quiz),
            "other" => Some(RequestType::Other),
            _ => None,
        }
    }
}

/// Quiz request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct QuizRequest {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub request_type: RequestType,
    pub content: String,
    pub is_handled: bool,
    pub handled_quiz_id: Option<i64>,
    pub created_at: i64,
}

/// Insert payload for a request
#[derive(Debug, Clone)]
pub struct NewQuizRequest {
    pub user_id: i64,
    pub group_id: i64,
    pub request_type: RequestType,
    pub content: String,
}

/// `POST /requests` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreate {
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreated {
    pub request_id: i64,
    pub remaining_points: i32,
}

/// Unhandled quiz request joined with its requester
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PendingRequest {
    pub request_id: i64,
    pub content: String,
    pub requester_name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequests {
    pub requests: Vec<PendingRequest>,
}
