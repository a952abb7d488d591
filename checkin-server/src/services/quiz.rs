//! Quiz creation, answering, pending lookup and history

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    AnswerResult, MAX_QUESTION_CHARS, MIN_QUIZ_OPTIONS, NewAnswer, NewQuiz, NewQuizOption,
    PendingOption, PendingQuiz, QuizAuthor, QuizCreated, QuizDetail, QuizHistory,
};

use crate::db::{
    AnswerRepository, GroupRepository, QuizRepository, RepoError, Repositories,
    RequestRepository, UserRepository,
};
use crate::error::ServiceResult;
use crate::line::{Messenger, messages, send_bulk};

use super::hooks::BoxError;
use super::{AfterCommit, FrontendLinks, is_family, line_ids, require_membership};

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
pub const MAX_HISTORY_LIMIT: i64 = 50;

pub struct QuizService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    quizzes: Arc<dyn QuizRepository>,
    answers: Arc<dyn AnswerRepository>,
    requests: Arc<dyn RequestRepository>,
    messenger: Arc<dyn Messenger>,
    links: FrontendLinks,
}

impl QuizService {
    pub fn new(repos: &Repositories, messenger: Arc<dyn Messenger>, links: FrontendLinks) -> Self {
        Self {
            users: repos.users.clone(),
            groups: repos.groups.clone(),
            quizzes: repos.quizzes.clone(),
            answers: repos.answers.clone(),
            requests: repos.requests.clone(),
            messenger,
            links,
        }
    }

    /// Post a quiz to the caller's group (grandparents only)
    pub async fn create_quiz(
        &self,
        user_id: i64,
        question_text: &str,
        options: Vec<NewQuizOption>,
    ) -> ServiceResult<QuizCreated> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ErrorCode::UserNotFound)?;
        if !user.is_grandparent() {
            return Err(ErrorCode::GrandparentRequired.into());
        }
        let membership = require_membership(self.groups.as_ref(), user_id).await?;

        let question_text = question_text.trim();
        if question_text.is_empty() {
            return Err(AppError::required("questionText").into());
        }
        if question_text.chars().count() > MAX_QUESTION_CHARS {
            return Err(AppError::new(ErrorCode::QuestionTooLong)
                .for_field("questionText")
                .into());
        }
        if options.len() < MIN_QUIZ_OPTIONS {
            return Err(AppError::new(ErrorCode::TooFewOptions)
                .for_field("options")
                .into());
        }
        if !options.iter().any(|o| o.is_correct) {
            return Err(AppError::new(ErrorCode::NoCorrectOption)
                .for_field("options")
                .into());
        }
        let mut cleaned = Vec::with_capacity(options.len());
        for (i, option) in options.into_iter().enumerate() {
            let text = option.option_text.trim();
            if text.is_empty() {
                return Err(AppError::new(ErrorCode::EmptyOptionText)
                    .for_field(&format!("options[{i}].optionText"))
                    .into());
            }
            cleaned.push(NewQuizOption {
                option_text: text.to_string(),
                is_correct: option.is_correct,
            });
        }

        let detail = self
            .quizzes
            .create(NewQuiz {
                group_id: membership.group_id,
                grandparent_id: user_id,
                question_text: question_text.to_string(),
                options: cleaned,
            })
            .await?;
        let quiz_id = detail.quiz.id;
        tracing::info!(quiz_id, group_id = membership.group_id, "Quiz created");

        let mut hooks = AfterCommit::new();
        hooks.push(
            "fulfil_quiz_request",
            fulfil_oldest_request(
                self.requests.clone(),
                self.users.clone(),
                self.messenger.clone(),
                membership.group_id,
                quiz_id,
                self.links.quiz_page(quiz_id),
            ),
        );
        hooks.push(
            "notify_new_quiz",
            notify_new_quiz(
                self.groups.clone(),
                self.messenger.clone(),
                membership.group_id,
                detail.quiz.question_text.clone(),
                self.links.quiz_page(quiz_id),
            ),
        );
        hooks.run().await;

        Ok(QuizCreated {
            quiz_id,
            message: "Quiz created successfully".to_string(),
        })
    }

    /// Answer a quiz once; a correct answer earns one point
    pub async fn answer_quiz(
        &self,
        user_id: i64,
        quiz_id: i64,
        selected_option_id: i64,
        message: Option<String>,
    ) -> ServiceResult<AnswerResult> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or(ErrorCode::QuizNotFound)?;
        // Quizzes of other groups are invisible
        let in_group = self
            .groups
            .find_membership(user_id)
            .await?
            .is_some_and(|m| m.group_id == quiz.quiz.group_id);
        if !in_group {
            return Err(ErrorCode::QuizNotFound.into());
        }

        let option = self
            .quizzes
            .find_option(selected_option_id)
            .await?
            .ok_or(ErrorCode::OptionNotFound)?;
        if option.quiz_id != quiz_id {
            return Err(AppError::new(ErrorCode::OptionMismatch)
                .for_field("selectedOptionId")
                .into());
        }
        if self.answers.find(quiz_id, user_id).await?.is_some() {
            return Err(ErrorCode::AlreadyAnswered.into());
        }

        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let created = self
            .answers
            .create(NewAnswer {
                quiz_id,
                family_member_id: user_id,
                selected_option_id,
                is_correct: option.is_correct,
                message,
            })
            .await;
        match created {
            Ok(_) => {}
            Err(RepoError::Duplicate(_)) => return Err(ErrorCode::AlreadyAnswered.into()),
            Err(e) => return Err(e.into()),
        }

        if option.is_correct {
            let points = self.users.add_points(user_id, 1).await?;
            tracing::debug!(user_id, points, "Point awarded for correct answer");
        }

        Ok(AnswerResult {
            is_correct: option.is_correct,
            correct_option_id: quiz.correct_option_id(),
        })
    }

    /// Newest quiz of the caller's group the caller has not answered yet
    pub async fn pending_quiz(&self, user_id: i64) -> ServiceResult<Option<PendingQuiz>> {
        let membership = require_membership(self.groups.as_ref(), user_id).await?;
        let Some(detail) = self
            .quizzes
            .pending_for_user(membership.group_id, user_id)
            .await?
        else {
            return Ok(None);
        };

        let author_name = self
            .users
            .find_by_id(detail.quiz.grandparent_id)
            .await?
            .map(|u| u.display_name)
            .unwrap_or_default();

        Ok(Some(pending_view(detail, author_name)))
    }

    /// One page of the group's quizzes with every answer
    pub async fn history(
        &self,
        user_id: i64,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<QuizHistory> {
        let membership = require_membership(self.groups.as_ref(), user_id).await?;
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let offset = (page - 1).saturating_mul(limit);

        let (quizzes, total) = self
            .quizzes
            .history(membership.group_id, offset, limit)
            .await?;
        Ok(QuizHistory {
            quizzes,
            total,
            page,
            limit,
        })
    }
}

fn pending_view(detail: QuizDetail, author_name: String) -> PendingQuiz {
    PendingQuiz {
        quiz_id: detail.quiz.id,
        question_text: detail.quiz.question_text,
        options: detail
            .options
            .into_iter()
            .map(|o| PendingOption {
                id: o.id,
                option_text: o.option_text,
            })
            .collect(),
        grandparent: QuizAuthor {
            id: detail.quiz.grandparent_id,
            display_name: author_name,
        },
    }
}

async fn fulfil_oldest_request(
    requests: Arc<dyn RequestRepository>,
    users: Arc<dyn UserRepository>,
    messenger: Arc<dyn Messenger>,
    group_id: i64,
    quiz_id: i64,
    quiz_url: String,
) -> Result<(), BoxError> {
    let Some(request) = requests.oldest_unhandled_quiz_request(group_id).await? else {
        return Ok(());
    };
    if !requests.mark_handled(request.id, quiz_id).await? {
        return Ok(());
    }
    tracing::info!(request_id = request.id, quiz_id, "Quiz request fulfilled");

    let Some(requester) = users.find_by_id(request.user_id).await? else {
        return Ok(());
    };
    if requester.line_id.is_empty() {
        return Ok(());
    }
    messenger
        .push(
            &requester.line_id,
            &messages::request_fulfilled(&request.content, &quiz_url),
        )
        .await?;
    Ok(())
}

async fn notify_new_quiz(
    groups: Arc<dyn GroupRepository>,
    messenger: Arc<dyn Messenger>,
    group_id: i64,
    question_text: String,
    quiz_url: String,
) -> Result<(), BoxError> {
    let members = groups.list_members(group_id).await?;
    let recipients = line_ids(&members, is_family);
    let result = send_bulk(
        messenger.as_ref(),
        &recipients,
        &messages::new_quiz(&question_text, &quiz_url),
    )
    .await;
    tracing::info!(
        group_id,
        success = result.success,
        failure = result.failure,
        "New quiz notification sent"
    );
    Ok(())
}
