//! Login and profile management

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{MeResponse, Role, User, UserCreate};

use crate::auth::SessionKeys;
use crate::db::{GroupRepository, RepoError, Repositories, UserRepository};
use crate::error::{ServiceError, ServiceResult};
use crate::line::{IdentityProvider, LoginCredential};

/// Result of a successful LINE login
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub is_new_user: bool,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    identity: Arc<dyn IdentityProvider>,
    sessions: SessionKeys,
}

impl AuthService {
    pub fn new(
        repos: &Repositories,
        identity: Arc<dyn IdentityProvider>,
        sessions: SessionKeys,
    ) -> Self {
        Self {
            users: repos.users.clone(),
            groups: repos.groups.clone(),
            identity,
            sessions,
        }
    }

    fn issue_token(&self, user: &User) -> ServiceResult<String> {
        self.sessions.issue(user).map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Session token creation failed");
            ServiceError::from(ErrorCode::InternalError)
        })
    }

    /// Verify the credential with LINE, creating the user on first login
    pub async fn login(&self, credential: LoginCredential) -> ServiceResult<LoginOutcome> {
        let identity = self
            .identity
            .verify(&credential)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "LINE login verification unavailable");
                ServiceError::from(ErrorCode::NetworkError)
            })?
            .ok_or(ErrorCode::InvalidCredentials)?;

        let (user, is_new_user) = match self.users.find_by_line_id(&identity.line_id).await? {
            Some(user) => (user, false),
            None => {
                let created = self
                    .users
                    .create(UserCreate {
                        line_id: identity.line_id.clone(),
                        display_name: identity.display_name.clone().unwrap_or_default(),
                    })
                    .await;
                match created {
                    Ok(user) => {
                        tracing::info!(user_id = user.id, "New user registered via LINE");
                        (user, true)
                    }
                    // Lost a race with a concurrent first login of the same account
                    Err(RepoError::Duplicate(_)) => {
                        let user = self
                            .users
                            .find_by_line_id(&identity.line_id)
                            .await?
                            .ok_or(ErrorCode::InternalError)?;
                        (user, false)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let token = self.issue_token(&user)?;
        Ok(LoginOutcome {
            token,
            is_new_user,
            user,
        })
    }

    /// Set display name and role, returning the updated user and a fresh token
    pub async fn update_profile(
        &self,
        user_id: i64,
        display_name: &str,
        role: &str,
    ) -> ServiceResult<(User, String)> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::required("displayName").into());
        }
        let role = Role::parse(role).ok_or_else(|| {
            AppError::with_message(ErrorCode::ValidationFailed, "invalid role").for_field("role")
        })?;

        let user = match self.users.update_profile(user_id, display_name, role).await {
            Ok(user) => user,
            Err(RepoError::NotFound(_)) => return Err(ErrorCode::UserNotFound.into()),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id, role = %role, "Profile updated");
        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Current user with group membership
    pub async fn me(&self, user_id: i64) -> ServiceResult<MeResponse> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ErrorCode::UserNotFound)?;
        let membership = self.groups.find_membership(user_id).await?;

        Ok(MeResponse {
            user_id: user.id,
            role: user.role,
            line_id: user.line_id,
            has_group: membership.is_some(),
            group_id: membership.map(|m| m.group_id),
        })
    }
}
