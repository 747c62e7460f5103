use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Answer {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    question_id: Uuid,
    selected_index: i32,
    text_answer: Option<String>,
    is_correct: bool,
    answered_at: DateTime<Utc>,
}

impl ResourceTyped for Answer {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Answer
    }
}

impl Answer {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn selected_index(&self) -> i32 {
        self.selected_index
    }

    pub fn text_answer(&self) -> Option<&str> {
        self.text_answer.as_deref()
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AnswerCreate {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub question_id: Uuid,
    pub selected_index: i32,
    pub text_answer: Option<String>,
    pub is_correct: bool,
}

#[async_trait]
impl CrudRepository<Answer, AnswerCreate, uuid::Uuid> for Answer {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnswerCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO answers (id, user_id, quiz_id, question_id, selected_index, text_answer, is_correct)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.quiz_id)
        .bind(data.question_id)
        .bind(data.selected_index)
        .bind(&data.text_answer)
        .bind(data.is_correct)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnswerCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE answers SET selected_index = $1, text_answer = $2, is_correct = $3 WHERE id = $4",
        )
        .bind(data.selected_index)
        .bind(&data.text_answer)
        .bind(data.is_correct)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.selected_index = data.selected_index;
        self.text_answer = data.text_answer;
        self.is_correct = data.is_correct;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM answers WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM answers WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM answers ORDER BY answered_at DESC LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Answer, AnswerCreate, Uuid);

#[async_trait]
impl HasOwner for Answer {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

// Utils

impl Answer {
    pub async fn all_by_user_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            "SELECT * FROM answers WHERE user_id = $1 AND quiz_id = $2 ORDER BY answered_at DESC",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    /// Replace the whole answer set for (user, quiz). Delete-then-insert,
    /// last write wins; there is deliberately no conflict detection here.
    pub async fn replace_for_quiz(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
        rows: Vec<AnswerCreate>,
    ) -> DatabaseResult<Vec<Self>> {
        sqlx::query("DELETE FROM answers WHERE user_id = $1 AND quiz_id = $2")
            .bind(user_id)
            .bind(quiz_id)
            .execute(mm.executor())
            .await?;

        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            created.push(Answer::create(mm, actor, row).await?);
        }
        Ok(created)
    }

    /// Manual grade override, keeps the stored selection and text untouched.
    pub async fn set_grade(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        is_correct: bool,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE answers SET is_correct = $1 WHERE id = $2")
            .bind(is_correct)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.is_correct = is_correct;
        Ok(self)
    }

    pub async fn count_completed_quizzes(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT quiz_id) FROM answers WHERE user_id = $1")
                .bind(actor.user_id())
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }

    /// Distinct (user, quiz) pairs over the whole table.
    pub async fn count_distinct_completions(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM (SELECT DISTINCT user_id, quiz_id FROM answers) c",
        )
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// Mean of per-completion accuracy (percent) across every student.
    pub async fn average_score(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<f64> {
        let result: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(AVG(pct), 0)
            FROM (
                SELECT (COUNT(*) FILTER (WHERE is_correct))::float8 / COUNT(*) * 100 AS pct
                FROM answers
                GROUP BY user_id, quiz_id
            ) s
            "#,
        )
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

/// Per-quiz accuracy of a single user.
#[derive(Debug, FromRow)]
pub struct QuizScoreRow {
    pub quiz_id: Uuid,
    pub correct: i64,
    pub total: i64,
}

impl QuizScoreRow {
    pub async fn fetch_for_user(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                quiz_id,
                COUNT(*) FILTER (WHERE is_correct) AS correct,
                COUNT(*) AS total
            FROM answers
            WHERE user_id = $1
            GROUP BY quiz_id
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

/// One student's result on a quiz, for the teacher's retake manager.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct CompletionRow {
    pub user_id: Uuid,
    pub name: String,
    pub correct: i64,
    pub total: i64,
}

impl CompletionRow {
    pub async fn fetch_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                a.user_id,
                u.name,
                COUNT(*) FILTER (WHERE a.is_correct) AS correct,
                COUNT(*) AS total
            FROM answers a
            JOIN users u ON u.id = a.user_id
            WHERE a.quiz_id = $1
            GROUP BY a.user_id, u.name
            ORDER BY u.name
            "#,
        )
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
