//! Quiz Model

use serde::{Deserialize, Serialize};

/// Maximum question length, counted in characters
pub const MAX_QUESTION_CHARS: usize = 100;

/// Minimum number of options per quiz
pub const MIN_QUIZ_OPTIONS: usize = 2;

/// Quiz entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Quiz {
    pub id: i64,
    pub group_id: i64,
    /// Author (grandparent user id)
    pub grandparent_id: i64,
    pub question_text: String,
    pub created_at: i64,
}

/// Quiz option (independent table)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct QuizOption {
    pub id: i64,
    pub quiz_id: i64,
    pub option_text: String,
    pub is_correct: bool,
}

/// Quiz with its options in insertion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub options: Vec<QuizOption>,
}

impl QuizDetail {
    /// Id of the first option flagged correct
    pub fn correct_option_id(&self) -> Option<i64> {
        self.options.iter().find(|o| o.is_correct).map(|o| o.id)
    }
}

/// Option as submitted by the author
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOptionInput {
    #[serde(default)]
    pub option_text: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
}

/// `POST /quizzes` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCreate {
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<QuizOptionInput>>,
}

/// Validated option ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuizOption {
    pub option_text: String,
    pub is_correct: bool,
}

/// Validated quiz ready for insertion
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub group_id: i64,
    pub grandparent_id: i64,
    pub question_text: String,
    pub options: Vec<NewQuizOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCreated {
    pub quiz_id: i64,
    pub message: String,
}

/// Author summary embedded in quiz views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct QuizAuthor {
    pub id: i64,
    pub display_name: String,
}

/// Option without its correctness flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOption {
    pub id: i64,
    pub option_text: String,
}

/// `GET /quizzes/pending` (or `null`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuiz {
    pub quiz_id: i64,
    pub question_text: String,
    pub options: Vec<PendingOption>,
    pub grandparent: QuizAuthor,
}

/// Answer entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Answer {
    pub id: i64,
    pub quiz_id: i64,
    pub family_member_id: i64,
    pub selected_option_id: i64,
    pub is_correct: bool,
    pub message: Option<String>,
    pub created_at: i64,
}

/// Insert payload for an answer
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub quiz_id: i64,
    pub family_member_id: i64,
    pub selected_option_id: i64,
    pub is_correct: bool,
    pub message: Option<String>,
}

/// `POST /quizzes/{quizId}/answer` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmit {
    #[serde(default)]
    pub selected_option_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub is_correct: bool,
    pub correct_option_id: Option<i64>,
}

/// `GET /quizzes/history` query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// One answer inside a history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct HistoryAnswer {
    pub answer_id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub selected_option_id: i64,
    pub selected_option_text: String,
    pub is_correct: bool,
    pub message: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuiz {
    pub quiz_id: i64,
    pub question_text: String,
    pub created_at: i64,
    pub grandparent: QuizAuthor,
    pub options: Vec<PendingOption>,
    pub answers: Vec<HistoryAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizHistory {
    pub quizzes: Vec<HistoryQuiz>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
