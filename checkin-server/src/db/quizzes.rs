//! Quiz and option storage

use std::collections::HashMap;

use async_trait::async_trait;
use shared::models::{
    HistoryAnswer, HistoryQuiz, NewQuiz, PendingOption, Quiz, QuizAuthor, QuizDetail, QuizOption,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::{QuizRepository, RepoResult};

const QUIZ_COLUMNS: &str = "id, group_id, grandparent_id, question_text, created_at";
const OPTION_COLUMNS: &str = "id, quiz_id, option_text, is_correct";

#[derive(sqlx::FromRow)]
struct HistoryQuizRow {
    id: i64,
    question_text: String,
    created_at: i64,
    author_id: i64,
    author_name: String,
}

pub struct PgQuizRepository {
    pool: PgPool,
}

impl PgQuizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn options_for(&self, quiz_ids: &[i64]) -> RepoResult<Vec<QuizOption>> {
        let options = sqlx::query_as::<_, QuizOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM quiz_options WHERE quiz_id = ANY($1) ORDER BY quiz_id, position"
        ))
        .bind(quiz_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn with_options(&self, quiz: Option<Quiz>) -> RepoResult<Option<QuizDetail>> {
        let Some(quiz) = quiz else {
            return Ok(None);
        };
        let options = self.options_for(&[quiz.id]).await?;
        Ok(Some(QuizDetail { quiz, options }))
    }
}

#[async_trait]
impl QuizRepository for PgQuizRepository {
    async fn create(&self, data: NewQuiz) -> RepoResult<QuizDetail> {
        let mut tx = self.pool.begin().await?;

        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "INSERT INTO quizzes (id, group_id, grandparent_id, question_text, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(snowflake_id())
        .bind(data.group_id)
        .bind(data.grandparent_id)
        .bind(&data.question_text)
        .bind(now_millis())
        .fetch_one(&mut *tx)
        .await?;

        let mut options = Vec::with_capacity(data.options.len());
        for (position, option) in data.options.iter().enumerate() {
            let row = sqlx::query_as::<_, QuizOption>(&format!(
                "INSERT INTO quiz_options (id, quiz_id, position, option_text, is_correct) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {OPTION_COLUMNS}"
            ))
            .bind(snowflake_id())
            .bind(quiz.id)
            .bind(position as i32)
            .bind(&option.option_text)
            .bind(option.is_correct)
            .fetch_one(&mut *tx)
            .await?;
            options.push(row);
        }

        tx.commit().await?;
        Ok(QuizDetail { quiz, options })
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<QuizDetail>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.with_options(quiz).await
    }

    async fn find_option(&self, option_id: i64) -> RepoResult<Option<QuizOption>> {
        let option = sqlx::query_as::<_, QuizOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM quiz_options WHERE id = $1"
        ))
        .bind(option_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn latest_for_group(&self, group_id: i64) -> RepoResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE group_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn pending_for_user(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> RepoResult<Option<QuizDetail>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes q \
             WHERE q.group_id = $1 \
               AND NOT EXISTS (SELECT 1 FROM answers a WHERE a.quiz_id = q.id AND a.family_member_id = $2) \
             ORDER BY q.created_at DESC, q.id DESC LIMIT 1"
        ))
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        self.with_options(quiz).await
    }

    async fn history(
        &self,
        group_id: i64,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<HistoryQuiz>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, HistoryQuizRow>(
            "SELECT q.id, q.question_text, q.created_at, u.id AS author_id, u.display_name AS author_name \
             FROM quizzes q JOIN users u ON u.id = q.grandparent_id \
             WHERE q.group_id = $1 \
             ORDER BY q.created_at DESC, q.id DESC \
             OFFSET $2 LIMIT $3",
        )
        .bind(group_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok((Vec::new(), total));
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut options: HashMap<i64, Vec<PendingOption>> = HashMap::new();
        for option in self.options_for(&ids).await? {
            options.entry(option.quiz_id).or_default().push(PendingOption {
                id: option.id,
                option_text: option.option_text,
            });
        }

        let answer_rows = sqlx::query_as::<_, HistoryAnswer>(
            "SELECT a.id AS answer_id, a.quiz_id, u.id AS user_id, u.display_name, \
                    a.selected_option_id, o.option_text AS selected_option_text, \
                    a.is_correct, a.message, a.created_at \
             FROM answers a \
             JOIN users u ON u.id = a.family_member_id \
             JOIN quiz_options o ON o.id = a.selected_option_id \
             WHERE a.quiz_id = ANY($1) \
             ORDER BY a.created_at",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut answers: HashMap<i64, Vec<HistoryAnswer>> = HashMap::new();
        for answer in answer_rows {
            answers.entry(answer.quiz_id).or_default().push(answer);
        }

        let quizzes = rows
            .into_iter()
            .map(|row| HistoryQuiz {
                quiz_id: row.id,
                question_text: row.question_text,
                created_at: row.created_at,
                grandparent: QuizAuthor {
                    id: row.author_id,
                    display_name: row.author_name,
                },
                options: options.remove(&row.id).unwrap_or_default(),
                answers: answers.remove(&row.id).unwrap_or_default(),
            })
            .collect();

        Ok((quizzes, total))
    }
}
