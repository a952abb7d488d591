//! Emergency broadcast

use std::sync::Arc;

use shared::error::ErrorCode;
use shared::models::AlertKind;

use crate::db::{AlertRepository, GroupRepository, Repositories, UserRepository};
use crate::error::ServiceResult;
use crate::line::{Messenger, messages, send_bulk};

use super::hooks::BoxError;
use super::{AfterCommit, is_family, line_ids, require_membership};

pub struct AlertService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    alerts: Arc<dyn AlertRepository>,
    messenger: Arc<dyn Messenger>,
}

impl AlertService {
    pub fn new(repos: &Repositories, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            users: repos.users.clone(),
            groups: repos.groups.clone(),
            alerts: repos.alerts.clone(),
            messenger,
        }
    }

    /// Record an emergency raised by a grandparent and alert the family
    pub async fn emergency(&self, user_id: i64) -> ServiceResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ErrorCode::UserNotFound)?;
        if !user.is_grandparent() {
            return Err(ErrorCode::GrandparentRequired.into());
        }
        let membership = require_membership(self.groups.as_ref(), user_id).await?;
        let group_id = membership.group_id;

        let alert = self
            .alerts
            .create(group_id, AlertKind::Emergency, Some(user_id))
            .await?;
        tracing::warn!(alert_id = alert.id, group_id, user_id, "Emergency alert raised");

        let groups = self.groups.clone();
        let messenger = self.messenger.clone();
        let name = user.display_name;
        let mut hooks = AfterCommit::new();
        hooks.push("notify_emergency", async move {
            let members = groups.list_members(group_id).await?;
            let recipients = line_ids(&members, is_family);
            let result = send_bulk(
                messenger.as_ref(),
                &recipients,
                &messages::emergency_alert(&name),
            )
            .await;
            tracing::info!(
                group_id,
                success = result.success,
                failure = result.failure,
                "Emergency notification sent"
            );
            Ok::<(), BoxError>(())
        });
        hooks.run().await;

        Ok(())
    }
}
