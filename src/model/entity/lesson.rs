use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content: String,
    attachment_url: Option<String>,
    order_index: i32,
    visible: bool,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn module_id(&self) -> uuid::Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attachment_url(&self) -> Option<&str> {
        self.attachment_url.as_deref()
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn visible(&self) -> bool {
        self.visible
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub module_id: Uuid,
    pub title: String,
    pub content: String,
    pub attachment_url: Option<String>,
    pub order_index: Option<i32>,
    pub visible: Option<bool>,
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, uuid::Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO lessons (id, module_id, title, content, attachment_url, order_index, visible) VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(data.module_id)
            .bind(&data.title)
            .bind(&data.content)
            .bind(&data.attachment_url)
            .bind(data.order_index.unwrap_or(0))
            .bind(data.visible.unwrap_or(true))
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        Ok(Lesson {
            id,
            module_id: data.module_id,
            title: data.title,
            content: data.content,
            attachment_url: data.attachment_url,
            order_index: data.order_index.unwrap_or(0),
            visible: data.visible.unwrap_or(true),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let visible = data.visible.unwrap_or(self.visible);
        sqlx::query("UPDATE lessons SET module_id = $1, title = $2, content = $3, attachment_url = $4, order_index = $5, visible = $6 WHERE id = $7")
            .bind(data.module_id)
            .bind(&data.title)
            .bind(&data.content)
            .bind(&data.attachment_url)
            .bind(data.order_index.unwrap_or(0))
            .bind(visible)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.module_id = data.module_id;
        self.title = data.title;
        self.content = data.content;
        self.attachment_url = data.attachment_url;
        self.order_index = data.order_index.unwrap_or(0);
        self.visible = visible;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM lessons ORDER BY order_index LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Lesson {
    /// Lessons the caller may actually read. Students only count lessons in
    /// visible modules that are themselves visible.
    pub async fn count_visible(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<i64> {
        let include_hidden = actor.is_teacher();
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE $1 OR (l.visible AND m.visible)
            "#,
        )
        .bind(include_hidden)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn all_by_module(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        mid: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM lessons WHERE module_id = $1 ORDER BY order_index")
            .bind(mid)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Lesson, LessonCreate, Uuid);

#[async_trait]
impl HasOwner for Lesson {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let owner: Uuid = sqlx::query_scalar("SELECT created_by FROM modules WHERE id = $1")
            .bind(self.module_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(owner)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonWithStatusRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content: String,
    pub attachment_url: Option<String>,
    pub visible: bool,
    pub read: bool,
}

impl LessonWithStatusRow {
    pub async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT
                l.id,
                l.module_id,
                l.title,
                l.content,
                l.attachment_url,
                l.visible,
                lr.id IS NOT NULL AS "read"
            FROM lessons l
            LEFT JOIN lesson_reads lr
                ON l.id = lr.lesson_id AND lr.user_id = $2
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }
}
