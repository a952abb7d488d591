//! Family group creation, joining and member statistics

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    GroupCreated, GroupJoined, MIN_ALERT_FREQUENCY_DAYS, MIN_GROUP_PASSWORD_LEN, MemberStat,
    MemberStats, NewGroup,
};

use crate::db::{GroupRepository, RepoError, Repositories, UserRepository};
use crate::error::{ServiceError, ServiceResult};
use crate::util::{generate_group_code, hash_password, verify_password};

const MAX_CODE_ATTEMPTS: usize = 10;
const DEFAULT_ALERT_FREQUENCY_DAYS: f64 = 1.0;

/// Validated input for group creation
#[derive(Debug, Clone)]
pub struct CreateGroupInput {
    pub group_name: String,
    pub password: String,
    pub alert_frequency_days: Option<f64>,
}

pub struct GroupService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            groups: repos.groups.clone(),
        }
    }

    pub async fn create_group(
        &self,
        user_id: i64,
        input: CreateGroupInput,
    ) -> ServiceResult<GroupCreated> {
        let group_name = input.group_name.trim().to_string();
        if group_name.is_empty() {
            return Err(AppError::required("groupName").into());
        }
        if input.password.chars().count() < MIN_GROUP_PASSWORD_LEN {
            return Err(AppError::new(ErrorCode::PasswordTooShort)
                .for_field("password")
                .into());
        }
        let alert_frequency_days = input
            .alert_frequency_days
            .unwrap_or(DEFAULT_ALERT_FREQUENCY_DAYS);
        if !alert_frequency_days.is_finite() || alert_frequency_days < MIN_ALERT_FREQUENCY_DAYS {
            return Err(AppError::new(ErrorCode::InvalidAlertFrequency)
                .for_field("alertFrequencyDays")
                .into());
        }

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ErrorCode::UserNotFound)?;
        if self.groups.find_membership(user_id).await?.is_some() {
            return Err(ErrorCode::AlreadyInGroup.into());
        }

        let group_code = self.unused_code().await?;
        let password_hash = hash_password(&input.password).map_err(|e| {
            tracing::error!(error = %e, "Group password hashing failed");
            ServiceError::from(ErrorCode::InternalError)
        })?;

        let created = self
            .groups
            .create_with_owner(
                NewGroup {
                    group_code,
                    group_name,
                    password_hash,
                    alert_frequency_days,
                },
                user_id,
            )
            .await;

        let group = match created {
            Ok(group) => group,
            // Either the owner joined a group concurrently or the code was taken
            Err(RepoError::Duplicate(_)) => {
                return Err(if self.groups.find_membership(user_id).await?.is_some() {
                    ErrorCode::AlreadyInGroup.into()
                } else {
                    ErrorCode::GroupCodeExhausted.into()
                });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(group_id = group.id, owner_id = user_id, "Family group created");
        Ok(GroupCreated {
            id: group.id,
            group_id: group.group_code,
            group_name: group.group_name,
        })
    }

    async fn unused_code(&self) -> ServiceResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_group_code();
            if !self.groups.code_exists(&code).await? {
                return Ok(code);
            }
        }
        tracing::error!("No unused group code after {MAX_CODE_ATTEMPTS} attempts");
        Err(ErrorCode::GroupCodeExhausted.into())
    }

    /// Join by group code and password.
    ///
    /// An unknown code and a wrong password are indistinguishable to the caller.
    pub async fn join_group(
        &self,
        user_id: i64,
        group_code: &str,
        password: &str,
    ) -> ServiceResult<GroupJoined> {
        let group_code = group_code.trim().to_uppercase();
        if group_code.is_empty() {
            return Err(AppError::required("groupId").into());
        }
        if password.is_empty() {
            return Err(AppError::required("password").into());
        }

        let group = self
            .groups
            .find_by_code(&group_code)
            .await?
            .ok_or(ErrorCode::GroupNotFound)?;
        if !verify_password(password, &group.password_hash) {
            tracing::info!(user_id, "Group join rejected");
            return Err(ErrorCode::GroupNotFound.into());
        }
        if self.groups.find_membership(user_id).await?.is_some() {
            return Err(ErrorCode::AlreadyInGroup.into());
        }

        match self.groups.add_member(group.id, user_id).await {
            Ok(()) => {}
            Err(RepoError::Duplicate(_)) => return Err(ErrorCode::AlreadyInGroup.into()),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(group_id = group.id, user_id, "Joined family group");
        Ok(GroupJoined {
            group_id: group.id,
            group_name: group.group_name,
        })
    }

    /// Correct-answer rate of every member, best first
    pub async fn member_stats(&self, user_id: i64) -> ServiceResult<MemberStats> {
        let membership = self.groups.find_membership(user_id).await?.ok_or_else(|| {
            AppError::with_message(ErrorCode::GroupNotFound, "You do not belong to a group")
        })?;

        let mut members: Vec<MemberStat> = self
            .groups
            .member_answer_counts(membership.group_id)
            .await?
            .into_iter()
            .map(|c| MemberStat {
                user_id: c.user_id,
                display_name: c.display_name,
                correct_rate: correct_rate(c.correct_answers, c.total_answers),
            })
            .collect();
        members.sort_by(|a, b| b.correct_rate.total_cmp(&a.correct_rate));

        Ok(MemberStats { members })
    }
}

/// `correct / total` rounded to two decimals, 0 when nothing was answered
fn correct_rate(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = correct as f64 / total as f64;
    (rate * 100.0).round() / 100.0
}
