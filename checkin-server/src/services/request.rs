//! Point-gated requests for quiz themes

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{NewQuizRequest, PendingRequests, REQUEST_COST, RequestCreated, RequestType};

use crate::db::{GroupRepository, Repositories, RequestRepository, UserRepository};
use crate::error::ServiceResult;
use crate::line::{Messenger, messages, send_bulk};

use super::hooks::BoxError;
use super::{AfterCommit, is_grandparent, line_ids, require_membership};

pub struct RequestService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    requests: Arc<dyn RequestRepository>,
    messenger: Arc<dyn Messenger>,
}

impl RequestService {
    pub fn new(repos: &Repositories, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            users: repos.users.clone(),
            groups: repos.groups.clone(),
            requests: repos.requests.clone(),
            messenger,
        }
    }

    /// Spend points on a request.
    ///
    /// `other` requests are forwarded to the grandparents right away; `quiz`
    /// requests wait for the next quiz of the group.
    pub async fn send_request(
        &self,
        user_id: i64,
        request_type: &str,
        content: &str,
    ) -> ServiceResult<RequestCreated> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ErrorCode::UserNotFound)?;
        let membership = require_membership(self.groups.as_ref(), user_id).await?;
        if user.points < REQUEST_COST {
            return Err(ErrorCode::InsufficientPoints.into());
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::required("content").into());
        }
        let request_type = RequestType::parse(request_type).ok_or_else(|| {
            AppError::new(ErrorCode::InvalidRequestType).for_field("requestType")
        })?;

        let remaining_points = self
            .users
            .try_spend_points(user_id, REQUEST_COST)
            .await?
            .ok_or(ErrorCode::InsufficientPoints)?;

        let created = self
            .requests
            .create(NewQuizRequest {
                user_id,
                group_id: membership.group_id,
                request_type,
                content: content.to_string(),
            })
            .await;
        let request = match created {
            Ok(request) => request,
            Err(e) => {
                if let Err(refund) = self.users.add_points(user_id, REQUEST_COST).await {
                    tracing::error!(user_id, error = %refund, "Point refund failed");
                }
                return Err(e.into());
            }
        };
        tracing::info!(
            request_id = request.id,
            user_id,
            request_type = request_type.as_str(),
            remaining_points,
            "Request created"
        );

        if request_type == RequestType::Other {
            let groups = self.groups.clone();
            let messenger = self.messenger.clone();
            let group_id = membership.group_id;
            let requester = user.display_name;
            let content = request.content.clone();
            let mut hooks = AfterCommit::new();
            hooks.push("notify_other_request", async move {
                let members = groups.list_members(group_id).await?;
                let recipients = line_ids(&members, is_grandparent);
                let result = send_bulk(
                    messenger.as_ref(),
                    &recipients,
                    &messages::other_request(&requester, &content),
                )
                .await;
                tracing::info!(
                    group_id,
                    success = result.success,
                    failure = result.failure,
                    "Request forwarded to grandparents"
                );
                Ok::<(), BoxError>(())
            });
            hooks.run().await;
        }

        Ok(RequestCreated {
            request_id: request.id,
            remaining_points,
        })
    }

    /// Unhandled quiz requests of the caller's group, oldest first
    pub async fn pending_requests(&self, user_id: i64) -> ServiceResult<PendingRequests> {
        let membership = require_membership(self.groups.as_ref(), user_id).await?;
        let requests = self
            .requests
            .pending_quiz_requests(membership.group_id)
            .await?;
        Ok(PendingRequests { requests })
    }
}
