//! Quizzes: creation, pending lookup, history, answering

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{
    AnswerResult, AnswerSubmit, HistoryQuery, NewQuizOption, PendingQuiz, QuizCreate,
    QuizCreated, QuizHistory,
};

use super::{ApiResult, json_body, required};
use crate::auth::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quizzes", post(create))
        .route("/quizzes/pending", get(pending))
        .route("/quizzes/history", get(history))
        .route("/quizzes/{quiz_id}/answer", post(answer))
}

/// POST /quizzes
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<QuizCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<QuizCreated>), AppError> {
    let body = json_body(payload)?;
    let question_text = required(body.question_text, "questionText")?;
    let options = required(body.options, "options")?
        .into_iter()
        .enumerate()
        .map(|(i, o)| {
            Ok(NewQuizOption {
                option_text: required(o.option_text, &format!("options[{i}].optionText"))?,
                is_correct: o.is_correct.unwrap_or(false),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let created = state
        .services
        .quizzes
        .create_quiz(user.user_id, &question_text, options)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /quizzes/pending - `null` when every quiz is answered
pub async fn pending(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Option<PendingQuiz>> {
    Ok(Json(state.services.quizzes.pending_quiz(user.user_id).await?))
}

/// GET /quizzes/history?page&limit
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<QuizHistory> {
    let history = state
        .services
        .quizzes
        .history(user.user_id, query.page, query.limit)
        .await?;
    Ok(Json(history))
}

/// POST /quizzes/{quiz_id}/answer
pub async fn answer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
    payload: Result<Json<AnswerSubmit>, JsonRejection>,
) -> ApiResult<AnswerResult> {
    let body = json_body(payload)?;
    let selected_option_id = required(body.selected_option_id, "selectedOptionId")?;
    let result = state
        .services
        .quizzes
        .answer_quiz(user.user_id, quiz_id, selected_option_id, body.message)
        .await?;
    Ok(Json(result))
}
