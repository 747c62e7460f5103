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
pub struct Quiz {
    id: Uuid,
    module_id: Option<Uuid>,
    lesson_id: Option<Uuid>,
    title: String,
    time_limit_sec: Option<i32>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Quiz {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Quiz
    }
}

impl Quiz {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Option<Uuid> {
        self.module_id
    }

    pub fn lesson_id(&self) -> Option<Uuid> {
        self.lesson_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn time_limit_sec(&self) -> Option<i32> {
        self.time_limit_sec
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizCreate {
    pub module_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub time_limit_sec: Option<i32>,
}

#[async_trait]
impl CrudRepository<Quiz, QuizCreate, uuid::Uuid> for Quiz {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quizzes (id, module_id, lesson_id, title, time_limit_sec, created_by)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(data.lesson_id)
        .bind(&data.title)
        .bind(data.time_limit_sec)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE quizzes SET module_id = $1, lesson_id = $2, title = $3, time_limit_sec = $4 WHERE id = $5",
        )
        .bind(data.module_id)
        .bind(data.lesson_id)
        .bind(&data.title)
        .bind(data.time_limit_sec)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.module_id = data.module_id;
        self.lesson_id = data.lesson_id;
        self.title = data.title;
        self.time_limit_sec = data.time_limit_sec;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        // children first
        sqlx::query("DELETE FROM answers WHERE quiz_id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        sqlx::query("DELETE FROM retake_grants WHERE quiz_id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        sqlx::query("DELETE FROM quizzes WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM quizzes ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Quiz, QuizCreate, Uuid);

#[async_trait]
impl HasOwner for Quiz {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.created_by)
    }
}

// Utils

impl Quiz {
    /// Quizzes the caller is allowed to see. Students only get quizzes whose
    /// module is visible (or that hang off no module at all).
    pub async fn count_visible(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let include_hidden = actor.is_teacher();
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM quizzes q
            LEFT JOIN modules m ON m.id = q.module_id
            WHERE $1 OR m.id IS NULL OR m.visible
            "#,
        )
        .bind(include_hidden)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// Whether students may reach this quiz at all. Quizzes without a module
    /// are always reachable.
    pub async fn in_visible_module(&self, mm: &ModelManager) -> DatabaseResult<bool> {
        let Some(module_id) = self.module_id else {
            return Ok(true);
        };
        let visible: Option<bool> =
            sqlx::query_scalar("SELECT visible FROM modules WHERE id = $1")
                .bind(module_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(visible.unwrap_or(true))
    }
}

/// One quiz row joined with the caller's completion state and retake balance.
#[derive(Debug, FromRow)]
pub struct QuizWithStateRow {
    pub id: Uuid,
    pub module_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub time_limit_sec: Option<i32>,
    pub created_by: Uuid,
    pub completed: bool,
    pub retakes_left: i32,
    pub lesson_read: bool,
}

impl QuizWithStateRow {
    pub async fn fetch_all(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        module_id: Option<Uuid>,
    ) -> DatabaseResult<Vec<Self>> {
        let include_hidden = actor.is_teacher();
        let rows = sqlx::query_as(
            r#"
            SELECT
                q.id,
                q.module_id,
                q.lesson_id,
                q.title,
                q.time_limit_sec,
                q.created_by,
                EXISTS (
                    SELECT 1 FROM answers a
                    WHERE a.quiz_id = q.id AND a.user_id = $1
                ) AS completed,
                COALESCE(rg.allowed, 0) AS retakes_left,
                (q.lesson_id IS NULL OR lr.id IS NOT NULL) AS lesson_read
            FROM quizzes q
            LEFT JOIN modules m ON m.id = q.module_id
            LEFT JOIN retake_grants rg
                ON rg.quiz_id = q.id AND rg.user_id = $1
            LEFT JOIN lesson_reads lr
                ON lr.lesson_id = q.lesson_id AND lr.user_id = $1
            WHERE ($2 OR m.id IS NULL OR m.visible)
            AND ($3::uuid IS NULL OR q.module_id = $3)
            ORDER BY q.created_at DESC
            "#,
        )
        .bind(actor.user_id())
        .bind(include_hidden)
        .bind(module_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
