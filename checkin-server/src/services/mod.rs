//! Business services
//!
//! Each service owns the repositories and collaborators it needs, injected
//! through its constructor. HTTP handlers and the scheduler only talk to
//! services.

pub mod alert;
pub mod auth;
pub mod batch;
pub mod group;
pub mod hooks;
pub mod quiz;
pub mod request;

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{GroupMember, Role};

use crate::auth::SessionKeys;
use crate::db::{GroupRepository, Repositories};
use crate::error::ServiceResult;
use crate::line::{IdentityProvider, Messenger};

pub use alert::AlertService;
pub use auth::AuthService;
pub use batch::{BatchKind, BatchService, BatchSummary};
pub use group::GroupService;
pub use hooks::AfterCommit;
pub use quiz::QuizService;
pub use request::RequestService;

/// Links embedded in notifications
#[derive(Debug, Clone)]
pub struct FrontendLinks {
    base: String,
}

impl FrontendLinks {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Answer page of one quiz
    pub fn quiz_page(&self, quiz_id: i64) -> String {
        format!("{}/quiz/{quiz_id}", self.base)
    }

    /// Grandparent quiz creation page
    pub fn create_page(&self) -> String {
        format!("{}/old", self.base)
    }
}

/// Every service, wired once at startup
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub groups: Arc<GroupService>,
    pub quizzes: Arc<QuizService>,
    pub alerts: Arc<AlertService>,
    pub batch: Arc<BatchService>,
    pub requests: Arc<RequestService>,
}

impl Services {
    pub fn new(
        repos: &Repositories,
        messenger: Arc<dyn Messenger>,
        identity: Arc<dyn IdentityProvider>,
        sessions: SessionKeys,
        links: FrontendLinks,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(repos, identity, sessions)),
            groups: Arc::new(GroupService::new(repos)),
            quizzes: Arc::new(QuizService::new(repos, messenger.clone(), links.clone())),
            alerts: Arc::new(AlertService::new(repos, messenger.clone())),
            batch: Arc::new(BatchService::new(repos, messenger.clone(), links)),
            requests: Arc::new(RequestService::new(repos, messenger)),
        }
    }
}

/// Caller's membership, or `GroupRequired`
pub(crate) async fn require_membership(
    groups: &dyn GroupRepository,
    user_id: i64,
) -> ServiceResult<GroupMember> {
    groups
        .find_membership(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::GroupRequired).into())
}

/// LINE ids of the members matching `filter`, skipping members without one
pub(crate) fn line_ids<F>(members: &[GroupMember], filter: F) -> Vec<String>
where
    F: Fn(Option<Role>) -> bool,
{
    members
        .iter()
        .filter(|m| filter(m.role) && !m.line_id.is_empty())
        .map(|m| m.line_id.clone())
        .collect()
}

/// Anyone who is not a grandparent, including members without a role yet
pub(crate) fn is_family(role: Option<Role>) -> bool {
    role != Some(Role::Grandparent)
}

pub(crate) fn is_grandparent(role: Option<Role>) -> bool {
    role == Some(Role::Grandparent)
}
