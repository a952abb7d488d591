//! Database access layer
//!
//! One repository trait per entity, each with a single Postgres
//! implementation. Services only see the traits, so tests can swap in
//! in-memory fakes.

pub mod alerts;
pub mod answers;
pub mod groups;
pub mod quizzes;
pub mod requests;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{
    AlertHistory, AlertKind, Answer, Group, GroupMember, HistoryQuiz, MemberAnswerCount,
    NewAnswer, NewGroup, NewQuiz, NewQuizRequest, PendingRequest, Quiz, QuizDetail, QuizOption,
    QuizRequest, Role, User, UserCreate,
};
use sqlx::PgPool;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_by_line_id(&self, line_id: &str) -> RepoResult<Option<User>>;
    async fn create(&self, data: UserCreate) -> RepoResult<User>;
    async fn update_profile(&self, id: i64, display_name: &str, role: Role) -> RepoResult<User>;
    /// Atomically add `delta` points, returning the new balance
    async fn add_points(&self, id: i64, delta: i32) -> RepoResult<i32>;
    /// Atomically spend `amount` points if the balance allows it.
    ///
    /// Returns the remaining balance, or `None` (balance untouched) when the
    /// user has fewer than `amount` points.
    async fn try_spend_points(&self, id: i64, amount: i32) -> RepoResult<Option<i32>>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn code_exists(&self, group_code: &str) -> RepoResult<bool>;
    /// Insert the group and its owner membership together
    async fn create_with_owner(&self, data: NewGroup, owner_id: i64) -> RepoResult<Group>;
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Group>>;
    async fn find_by_code(&self, group_code: &str) -> RepoResult<Option<Group>>;
    async fn list_all(&self) -> RepoResult<Vec<Group>>;
    /// Membership of `user_id` (a user belongs to at most one group)
    async fn find_membership(&self, user_id: i64) -> RepoResult<Option<GroupMember>>;
    async fn add_member(&self, group_id: i64, user_id: i64) -> RepoResult<()>;
    async fn list_members(&self, group_id: i64) -> RepoResult<Vec<GroupMember>>;
    async fn member_answer_counts(&self, group_id: i64) -> RepoResult<Vec<MemberAnswerCount>>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Insert the quiz and all of its options in one transaction
    async fn create(&self, data: NewQuiz) -> RepoResult<QuizDetail>;
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<QuizDetail>>;
    async fn find_option(&self, option_id: i64) -> RepoResult<Option<QuizOption>>;
    async fn latest_for_group(&self, group_id: i64) -> RepoResult<Option<Quiz>>;
    /// Newest quiz of the group that `user_id` has not answered
    async fn pending_for_user(&self, group_id: i64, user_id: i64)
    -> RepoResult<Option<QuizDetail>>;
    /// One page of quizzes, newest first, plus the total quiz count
    async fn history(
        &self,
        group_id: i64,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<HistoryQuiz>, i64)>;
}

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    async fn find(&self, quiz_id: i64, user_id: i64) -> RepoResult<Option<Answer>>;
    /// Fails with `Duplicate` if the user already answered the quiz
    async fn create(&self, data: NewAnswer) -> RepoResult<Answer>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn latest(&self, group_id: i64, kind: AlertKind) -> RepoResult<Option<AlertHistory>>;
    async fn create(
        &self,
        group_id: i64,
        kind: AlertKind,
        triggered_by: Option<i64>,
    ) -> RepoResult<AlertHistory>;
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn create(&self, data: NewQuizRequest) -> RepoResult<QuizRequest>;
    async fn oldest_unhandled_quiz_request(&self, group_id: i64)
    -> RepoResult<Option<QuizRequest>>;
    /// Link the request to `quiz_id`; `false` if it was already handled
    async fn mark_handled(&self, request_id: i64, quiz_id: i64) -> RepoResult<bool>;
    async fn pending_quiz_requests(&self, group_id: i64) -> RepoResult<Vec<PendingRequest>>;
}

/// The full repository set handed to services
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub requests: Arc<dyn RequestRepository>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(users::PgUserRepository::new(pool.clone())),
            groups: Arc::new(groups::PgGroupRepository::new(pool.clone())),
            quizzes: Arc::new(quizzes::PgQuizRepository::new(pool.clone())),
            answers: Arc::new(answers::PgAnswerRepository::new(pool.clone())),
            alerts: Arc::new(alerts::PgAlertRepository::new(pool.clone())),
            requests: Arc::new(requests::PgRequestRepository::new(pool)),
        }
    }
}
