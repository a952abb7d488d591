//! In-memory fakes for service and route tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::models::{
    AlertHistory, AlertKind, Answer, Group, GroupMember, HistoryAnswer, HistoryQuiz,
    MemberAnswerCount, NewAnswer, NewGroup, NewQuiz, NewQuizRequest, PendingOption,
    PendingRequest, Quiz, QuizAuthor, QuizDetail, QuizOption, QuizRequest, RequestType, Role,
    User, UserCreate,
};
use shared::util::now_millis;

use crate::db::{
    AlertRepository, AnswerRepository, GroupRepository, QuizRepository, RepoError, RepoResult,
    Repositories, RequestRepository, UserRepository,
};
use crate::line::{
    IdentityProvider, LineError, LineIdentity, LineMessage, LoginCredential, Messenger,
};
use crate::util::hash_password;

#[derive(Default)]
struct Data {
    next_id: i64,
    users: Vec<User>,
    groups: Vec<Group>,
    members: Vec<(i64, i64, bool)>,
    quizzes: Vec<QuizDetail>,
    answers: Vec<Answer>,
    alerts: Vec<AlertHistory>,
    requests: Vec<QuizRequest>,
    broken_groups: HashSet<i64>,
    stale_answer_reads: bool,
    failing_request_inserts: bool,
}

impl Data {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn member_view(&self, group_id: i64, user_id: i64, is_owner: bool) -> Option<GroupMember> {
        let user = self.users.iter().find(|u| u.id == user_id)?;
        Some(GroupMember {
            group_id,
            user_id,
            is_owner,
            display_name: user.display_name.clone(),
            line_id: user.line_id.clone(),
            role: user.role,
        })
    }

    fn display_name(&self, user_id: i64) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.display_name.clone())
            .unwrap_or_default()
    }

    fn group_quizzes_newest_first(&self, group_id: i64) -> Vec<&QuizDetail> {
        let mut quizzes: Vec<&QuizDetail> = self
            .quizzes
            .iter()
            .filter(|q| q.quiz.group_id == group_id)
            .collect();
        quizzes.sort_by_key(|q| std::cmp::Reverse((q.quiz.created_at, q.quiz.id)));
        quizzes
    }
}

/// Every repository over one shared in-memory dataset.
///
/// Uniqueness rules of the real schema are enforced and reported as
/// `RepoError::Duplicate`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Data>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.clone()),
            groups: Arc::new(self.clone()),
            quizzes: Arc::new(self.clone()),
            answers: Arc::new(self.clone()),
            alerts: Arc::new(self.clone()),
            requests: Arc::new(self.clone()),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Data) -> R) -> R {
        let mut data = self.data.lock().unwrap();
        f(&mut data)
    }

    // ---- seeding ----

    pub fn add_user(&self, line_id: &str, display_name: &str, role: Option<Role>) -> User {
        self.with(|d| {
            let user = User {
                id: d.id(),
                line_id: line_id.to_string(),
                display_name: display_name.to_string(),
                role,
                points: 0,
                created_at: now_millis(),
            };
            d.users.push(user.clone());
            user
        })
    }

    pub fn set_points(&self, user_id: i64, points: i32) {
        self.with(|d| {
            if let Some(u) = d.users.iter_mut().find(|u| u.id == user_id) {
                u.points = points;
            }
        })
    }

    pub fn add_group(&self, code: &str, name: &str, password: &str, freq: f64) -> Group {
        let password_hash = hash_password(password).unwrap();
        self.with(|d| {
            let group = Group {
                id: d.id(),
                group_code: code.to_string(),
                group_name: name.to_string(),
                password_hash,
                alert_frequency_days: freq,
                created_at: now_millis(),
            };
            d.groups.push(group.clone());
            group
        })
    }

    pub fn add_member(&self, group_id: i64, user_id: i64, is_owner: bool) {
        self.with(|d| d.members.push((group_id, user_id, is_owner)))
    }

    /// Quiz with a correct "Right" and an incorrect "Wrong" option, created
    /// `age_ms` milliseconds ago
    pub fn add_quiz(
        &self,
        group_id: i64,
        author_id: i64,
        question: &str,
        age_ms: i64,
    ) -> QuizDetail {
        self.with(|d| {
            let quiz = Quiz {
                id: d.id(),
                group_id,
                grandparent_id: author_id,
                question_text: question.to_string(),
                created_at: now_millis() - age_ms,
            };
            let options = [("Right", true), ("Wrong", false)]
                .into_iter()
                .map(|(text, is_correct)| QuizOption {
                    id: d.id(),
                    quiz_id: quiz.id,
                    option_text: text.to_string(),
                    is_correct,
                })
                .collect();
            let detail = QuizDetail { quiz, options };
            d.quizzes.push(detail.clone());
            detail
        })
    }

    pub fn add_answer(&self, quiz: &QuizDetail, user_id: i64, correct: bool) {
        let option = quiz
            .options
            .iter()
            .find(|o| o.is_correct == correct)
            .unwrap()
            .clone();
        self.with(|d| {
            let answer = Answer {
                id: d.id(),
                quiz_id: quiz.quiz.id,
                family_member_id: user_id,
                selected_option_id: option.id,
                is_correct: option.is_correct,
                message: None,
                created_at: now_millis(),
            };
            d.answers.push(answer);
        })
    }

    pub fn add_request(
        &self,
        user_id: i64,
        group_id: i64,
        request_type: RequestType,
        content: &str,
    ) -> i64 {
        self.with(|d| {
            let id = d.id();
            d.requests.push(QuizRequest {
                id,
                user_id,
                group_id,
                request_type,
                content: content.to_string(),
                is_handled: false,
                handled_quiz_id: None,
                created_at: now_millis(),
            });
            id
        })
    }

    /// Shift every recorded alert `ms` milliseconds into the past
    pub fn backdate_alerts(&self, ms: i64) {
        self.with(|d| d.alerts.iter_mut().for_each(|a| a.created_at -= ms))
    }

    /// Make quiz lookups for `group_id` fail with a database error
    pub fn fail_latest_quiz_for(&self, group_id: i64) {
        self.with(|d| d.broken_groups.insert(group_id));
    }

    /// Answer lookups report nothing, as if a concurrent answer landed after
    /// the check; the unique constraint on insert still applies
    pub fn stale_answer_reads(&self) {
        self.with(|d| d.stale_answer_reads = true);
    }

    /// Make request inserts fail with a database error
    pub fn fail_request_inserts(&self) {
        self.with(|d| d.failing_request_inserts = true);
    }

    // ---- inspection ----

    pub fn user(&self, id: i64) -> Option<User> {
        self.with(|d| d.users.iter().find(|u| u.id == id).cloned())
    }

    pub fn group(&self, id: i64) -> Option<Group> {
        self.with(|d| d.groups.iter().find(|g| g.id == id).cloned())
    }

    pub fn membership(&self, user_id: i64) -> Option<GroupMember> {
        self.with(|d| {
            let (group_id, _, owner) = *d.members.iter().find(|m| m.1 == user_id)?;
            d.member_view(group_id, user_id, owner)
        })
    }

    pub fn quiz(&self, id: i64) -> Option<QuizDetail> {
        self.with(|d| d.quizzes.iter().find(|q| q.quiz.id == id).cloned())
    }

    pub fn request(&self, id: i64) -> Option<QuizRequest> {
        self.with(|d| d.requests.iter().find(|r| r.id == id).cloned())
    }

    pub fn alerts(&self) -> Vec<AlertHistory> {
        self.with(|d| d.alerts.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.user(id))
    }

    async fn find_by_line_id(&self, line_id: &str) -> RepoResult<Option<User>> {
        Ok(self.with(|d| d.users.iter().find(|u| u.line_id == line_id).cloned()))
    }

    async fn create(&self, data: UserCreate) -> RepoResult<User> {
        if self.find_by_line_id(&data.line_id).await?.is_some() {
            return Err(RepoError::Duplicate(format!("line_id {}", data.line_id)));
        }
        Ok(self.add_user(&data.line_id, &data.display_name, None))
    }

    async fn update_profile(&self, id: i64, display_name: &str, role: Role) -> RepoResult<User> {
        self.with(|d| {
            let user = d
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| RepoError::NotFound(format!("user {id}")))?;
            user.display_name = display_name.to_string();
            user.role = Some(role);
            Ok(user.clone())
        })
    }

    async fn add_points(&self, id: i64, delta: i32) -> RepoResult<i32> {
        self.with(|d| {
            let user = d
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| RepoError::NotFound(format!("user {id}")))?;
            user.points += delta;
            Ok(user.points)
        })
    }

    async fn try_spend_points(&self, id: i64, amount: i32) -> RepoResult<Option<i32>> {
        self.with(|d| {
            let user = d
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| RepoError::NotFound(format!("user {id}")))?;
            if user.points < amount {
                return Ok(None);
            }
            user.points -= amount;
            Ok(Some(user.points))
        })
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn code_exists(&self, group_code: &str) -> RepoResult<bool> {
        Ok(self.with(|d| d.groups.iter().any(|g| g.group_code == group_code)))
    }

    async fn create_with_owner(&self, data: NewGroup, owner_id: i64) -> RepoResult<Group> {
        self.with(|d| {
            if d.groups.iter().any(|g| g.group_code == data.group_code) {
                return Err(RepoError::Duplicate("group_code".into()));
            }
            if d.members.iter().any(|m| m.1 == owner_id) {
                return Err(RepoError::Duplicate("group_members.user_id".into()));
            }
            let group = Group {
                id: d.id(),
                group_code: data.group_code,
                group_name: data.group_name,
                password_hash: data.password_hash,
                alert_frequency_days: data.alert_frequency_days,
                created_at: now_millis(),
            };
            d.groups.push(group.clone());
            d.members.push((group.id, owner_id, true));
            Ok(group)
        })
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Group>> {
        Ok(self.group(id))
    }

    async fn find_by_code(&self, group_code: &str) -> RepoResult<Option<Group>> {
        Ok(self.with(|d| d.groups.iter().find(|g| g.group_code == group_code).cloned()))
    }

    async fn list_all(&self) -> RepoResult<Vec<Group>> {
        Ok(self.with(|d| d.groups.clone()))
    }

    async fn find_membership(&self, user_id: i64) -> RepoResult<Option<GroupMember>> {
        Ok(self.membership(user_id))
    }

    async fn add_member(&self, group_id: i64, user_id: i64) -> RepoResult<()> {
        self.with(|d| {
            if d.members.iter().any(|m| m.1 == user_id) {
                return Err(RepoError::Duplicate("group_members.user_id".into()));
            }
            d.members.push((group_id, user_id, false));
            Ok(())
        })
    }

    async fn list_members(&self, group_id: i64) -> RepoResult<Vec<GroupMember>> {
        Ok(self.with(|d| {
            d.members
                .iter()
                .filter(|m| m.0 == group_id)
                .filter_map(|&(g, u, owner)| d.member_view(g, u, owner))
                .collect()
        }))
    }

    async fn member_answer_counts(&self, group_id: i64) -> RepoResult<Vec<MemberAnswerCount>> {
        Ok(self.with(|d| {
            d.members
                .iter()
                .filter(|m| m.0 == group_id)
                .map(|&(_, user_id, _)| {
                    let answers: Vec<&Answer> = d
                        .answers
                        .iter()
                        .filter(|a| a.family_member_id == user_id)
                        .collect();
                    MemberAnswerCount {
                        user_id,
                        display_name: d.display_name(user_id),
                        total_answers: answers.len() as i64,
                        correct_answers: answers.iter().filter(|a| a.is_correct).count() as i64,
                    }
                })
                .collect()
        }))
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn create(&self, data: NewQuiz) -> RepoResult<QuizDetail> {
        Ok(self.with(|d| {
            let quiz = Quiz {
                id: d.id(),
                group_id: data.group_id,
                grandparent_id: data.grandparent_id,
                question_text: data.question_text,
                created_at: now_millis(),
            };
            let options = data
                .options
                .into_iter()
                .map(|o| QuizOption {
                    id: d.id(),
                    quiz_id: quiz.id,
                    option_text: o.option_text,
                    is_correct: o.is_correct,
                })
                .collect();
            let detail = QuizDetail { quiz, options };
            d.quizzes.push(detail.clone());
            detail
        }))
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<QuizDetail>> {
        Ok(self.quiz(id))
    }

    async fn find_option(&self, option_id: i64) -> RepoResult<Option<QuizOption>> {
        Ok(self.with(|d| {
            d.quizzes
                .iter()
                .flat_map(|q| q.options.iter())
                .find(|o| o.id == option_id)
                .cloned()
        }))
    }

    async fn latest_for_group(&self, group_id: i64) -> RepoResult<Option<Quiz>> {
        self.with(|d| {
            if d.broken_groups.contains(&group_id) {
                return Err(RepoError::Database("connection reset".into()));
            }
            Ok(d
                .group_quizzes_newest_first(group_id)
                .first()
                .map(|q| q.quiz.clone()))
        })
    }

    async fn pending_for_user(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> RepoResult<Option<QuizDetail>> {
        Ok(self.with(|d| {
            d.group_quizzes_newest_first(group_id)
                .into_iter()
                .find(|q| {
                    !d.answers
                        .iter()
                        .any(|a| a.quiz_id == q.quiz.id && a.family_member_id == user_id)
                })
                .cloned()
        }))
    }

    async fn history(
        &self,
        group_id: i64,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<HistoryQuiz>, i64)> {
        Ok(self.with(|d| {
            let all = d.group_quizzes_newest_first(group_id);
            let total = all.len() as i64;
            let page = all
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|q| {
                    let option_text: HashMap<i64, &str> = q
                        .options
                        .iter()
                        .map(|o| (o.id, o.option_text.as_str()))
                        .collect();
                    HistoryQuiz {
                        quiz_id: q.quiz.id,
                        question_text: q.quiz.question_text.clone(),
                        created_at: q.quiz.created_at,
                        grandparent: QuizAuthor {
                            id: q.quiz.grandparent_id,
                            display_name: d.display_name(q.quiz.grandparent_id),
                        },
                        options: q
                            .options
                            .iter()
                            .map(|o| PendingOption {
                                id: o.id,
                                option_text: o.option_text.clone(),
                            })
                            .collect(),
                        answers: d
                            .answers
                            .iter()
                            .filter(|a| a.quiz_id == q.quiz.id)
                            .map(|a| HistoryAnswer {
                                answer_id: a.id,
                                quiz_id: a.quiz_id,
                                user_id: a.family_member_id,
                                display_name: d.display_name(a.family_member_id),
                                selected_option_id: a.selected_option_id,
                                selected_option_text: option_text
                                    .get(&a.selected_option_id)
                                    .map(|t| t.to_string())
                                    .unwrap_or_default(),
                                is_correct: a.is_correct,
                                message: a.message.clone(),
                                created_at: a.created_at,
                            })
                            .collect(),
                    }
                })
                .collect();
            (page, total)
        }))
    }
}

#[async_trait]
impl AnswerRepository for MemoryStore {
    async fn find(&self, quiz_id: i64, user_id: i64) -> RepoResult<Option<Answer>> {
        Ok(self.with(|d| {
            if d.stale_answer_reads {
                return None;
            }
            d.answers
                .iter()
                .find(|a| a.quiz_id == quiz_id && a.family_member_id == user_id)
                .cloned()
        }))
    }

    async fn create(&self, data: NewAnswer) -> RepoResult<Answer> {
        self.with(|d| {
            if d.answers
                .iter()
                .any(|a| a.quiz_id == data.quiz_id && a.family_member_id == data.family_member_id)
            {
                return Err(RepoError::Duplicate("answers (quiz_id, family_member_id)".into()));
            }
            let answer = Answer {
                id: d.id(),
                quiz_id: data.quiz_id,
                family_member_id: data.family_member_id,
                selected_option_id: data.selected_option_id,
                is_correct: data.is_correct,
                message: data.message,
                created_at: now_millis(),
            };
            d.answers.push(answer.clone());
            Ok(answer)
        })
    }
}

#[async_trait]
impl AlertRepository for MemoryStore {
    async fn latest(&self, group_id: i64, kind: AlertKind) -> RepoResult<Option<AlertHistory>> {
        Ok(self.with(|d| {
            d.alerts
                .iter()
                .filter(|a| a.group_id == group_id && a.kind == kind)
                .max_by_key(|a| (a.created_at, a.id))
                .cloned()
        }))
    }

    async fn create(
        &self,
        group_id: i64,
        kind: AlertKind,
        triggered_by: Option<i64>,
    ) -> RepoResult<AlertHistory> {
        Ok(self.with(|d| {
            let alert = AlertHistory {
                id: d.id(),
                group_id,
                kind,
                triggered_by,
                created_at: now_millis(),
            };
            d.alerts.push(alert.clone());
            alert
        }))
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn create(&self, data: NewQuizRequest) -> RepoResult<QuizRequest> {
        if self.with(|d| d.failing_request_inserts) {
            return Err(RepoError::Database("quiz_requests insert failed".into()));
        }
        let id = self.add_request(data.user_id, data.group_id, data.request_type, &data.content);
        self.request(id)
            .ok_or_else(|| RepoError::NotFound(format!("request {id}")))
    }

    async fn oldest_unhandled_quiz_request(
        &self,
        group_id: i64,
    ) -> RepoResult<Option<QuizRequest>> {
        Ok(self.with(|d| {
            d.requests
                .iter()
                .filter(|r| {
                    r.group_id == group_id && r.request_type == RequestType::Quiz && !r.is_handled
                })
                .min_by_key(|r| (r.created_at, r.id))
                .cloned()
        }))
    }

    async fn mark_handled(&self, request_id: i64, quiz_id: i64) -> RepoResult<bool> {
        Ok(self.with(|d| {
            match d
                .requests
                .iter_mut()
                .find(|r| r.id == request_id && !r.is_handled)
            {
                Some(r) => {
                    r.is_handled = true;
                    r.handled_quiz_id = Some(quiz_id);
                    true
                }
                None => false,
            }
        }))
    }

    async fn pending_quiz_requests(&self, group_id: i64) -> RepoResult<Vec<PendingRequest>> {
        Ok(self.with(|d| {
            let mut pending: Vec<&QuizRequest> = d
                .requests
                .iter()
                .filter(|r| {
                    r.group_id == group_id && r.request_type == RequestType::Quiz && !r.is_handled
                })
                .collect();
            pending.sort_by_key(|r| (r.created_at, r.id));
            pending
                .into_iter()
                .map(|r| PendingRequest {
                    request_id: r.id,
                    content: r.content.clone(),
                    requester_name: d.display_name(r.user_id),
                    created_at: r.created_at,
                })
                .collect()
        }))
    }
}

/// Records pushes; can be told to fail for some or all recipients
#[derive(Default)]
pub struct FakeMessenger {
    sent: Mutex<Vec<(String, Vec<LineMessage>)>>,
    failing: HashSet<String>,
    fail_all: AtomicBool,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Recipients of successful pushes, in order
    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }

    /// Text (or alt text) of the first message of each successful push
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, messages)| messages.first())
            .map(|m| match m {
                LineMessage::Text { text } => text.clone(),
                LineMessage::Flex { alt_text, .. } => alt_text.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn push(&self, to: &str, messages: &[LineMessage]) -> Result<(), LineError> {
        if self.fail_all.load(Ordering::SeqCst) || self.failing.contains(to) {
            return Err(LineError::Api {
                status: 500,
                body: "fake failure".into(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), messages.to_vec()));
        Ok(())
    }
}

/// Accepts a fixed set of codes and ID tokens
#[derive(Default)]
pub struct FakeIdentity {
    codes: HashMap<String, LineIdentity>,
    id_tokens: HashMap<String, LineIdentity>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: &str, line_id: &str, name: Option<&str>) -> Self {
        self.codes.insert(code.to_string(), identity(line_id, name));
        self
    }

    pub fn with_id_token(mut self, token: &str, line_id: &str, name: Option<&str>) -> Self {
        self.id_tokens.insert(token.to_string(), identity(line_id, name));
        self
    }
}

fn identity(line_id: &str, name: Option<&str>) -> LineIdentity {
    LineIdentity {
        line_id: line_id.to_string(),
        display_name: name.map(str::to_string),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify(
        &self,
        credential: &LoginCredential,
    ) -> Result<Option<LineIdentity>, LineError> {
        Ok(match credential {
            LoginCredential::Code(code) => self.codes.get(code).cloned(),
            LoginCredential::IdToken(token) => self.id_tokens.get(token).cloned(),
        })
    }
}
