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
pub struct LessonRead {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    read_at: DateTime<Utc>,
}

impl ResourceTyped for LessonRead {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LessonRead
    }
}

impl LessonRead {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn read_at(&self) -> &DateTime<Utc> {
        &self.read_at
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonReadCreate {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
}

#[async_trait]
impl CrudRepository<LessonRead, LessonReadCreate, uuid::Uuid> for LessonRead {
    /// Idempotent: marking an already-read lesson keeps the first read_at.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonReadCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO lesson_reads (id, user_id, lesson_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, lesson_id)
            DO UPDATE SET read_at = lesson_reads.read_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.lesson_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
        _data: LessonReadCreate,
    ) -> DatabaseResult<Self> {
        unimplemented!("Lesson reads should never be updated");
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lesson_reads WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM lesson_reads WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM lesson_reads LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lesson_reads WHERE user_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(LessonRead, LessonReadCreate, Uuid);

#[async_trait]
impl HasOwner for LessonRead {
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

impl LessonRead {
    pub async fn exists(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM lesson_reads WHERE user_id = $1 AND lesson_id = $2)",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(found)
    }
}
