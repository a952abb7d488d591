//! User Model

use serde::{Deserialize, Serialize};

/// Member role inside a family group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "user_role", rename_all = "snake_case"))]
pub enum Role {
    /// Posts quizzes and may raise emergency alerts
    Grandparent,
    /// Answers quizzes, earns points and sends requests
    Family,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Grandparent => "grandparent",
            Role::Family => "family",
        }
    }

    /// Parse the wire name; anything else is rejected
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "grandparent" => Some(Role::Grandparent),
            "family" => Some(Role::Family),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User entity
///
/// `role` stays `None` until the user completes profile setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub line_id: String,
    pub display_name: String,
    pub role: Option<Role>,
    pub points: i32,
    pub created_at: i64,
}

impl User {
    pub fn is_grandparent(&self) -> bool {
        self.role == Some(Role::Grandparent)
    }
}

/// Create user payload (first LINE login)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub line_id: String,
    pub display_name: String,
}

/// `POST /auth/line` body: either an authorization code or an ID token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAuthRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAuthResponse {
    pub is_new_user: bool,
}

/// `GET /users/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: i64,
    pub role: Option<Role>,
    pub line_id: String,
    pub has_group: bool,
    pub group_id: Option<i64>,
}

/// `PUT /users/me/profile` body
///
/// Both fields are optional at the type level so that a missing field is
/// reported as a field error rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: i64,
    pub display_name: String,
    pub role: Role,
}
