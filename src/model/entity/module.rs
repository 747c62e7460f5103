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
pub struct Module {
    id: uuid::Uuid,
    title: String,
    description: String,
    order_index: i32,
    visible: bool,
    created_by: Uuid,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleCreate {
    pub title: String,
    pub description: String,
    pub order_index: Option<i32>,
    pub visible: Option<bool>,
}

impl ResourceTyped for Module {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Module
    }
}

impl Module {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }
}

#[async_trait]
impl CrudRepository<Module, ModuleCreate, uuid::Uuid> for Module {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO modules (id, title, description, order_index, visible, created_by) VALUES ($1,$2,$3,$4,$5,$6) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.order_index.unwrap_or(0))
            .bind(data.visible.unwrap_or(true))
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        Ok(Module {
            id,
            title: data.title,
            description: data.description,
            order_index: data.order_index.unwrap_or(0),
            visible: data.visible.unwrap_or(true),
            created_by: actor.user_id(),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let visible = data.visible.unwrap_or(self.visible);
        sqlx::query(
            "UPDATE modules SET title = $1, description = $2, order_index = $3, visible = $4 WHERE id = $5",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.order_index.unwrap_or(0))
        .bind(visible)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.order_index = data.order_index.unwrap_or(0);
        self.visible = visible;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        // lessons first
        sqlx::query("DELETE FROM lessons WHERE module_id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        sqlx::query("DELETE FROM modules WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM modules WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM modules ORDER BY order_index LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Module, ModuleCreate, Uuid);

#[async_trait]
impl HasOwner for Module {
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

#[derive(sqlx::FromRow)]
pub struct ModuleWithLessonsRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub visible: bool,
    pub lessons: serde_json::Value,
}

impl ModuleWithLessonsRow {
    /// All modules with their lesson summaries and the caller's read flags.
    /// Students only get visible modules and lessons, teachers get everything.
    pub async fn fetch_all(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let include_hidden = actor.is_teacher();
        let rows: Vec<ModuleWithLessonsRow> = sqlx::query_as(
            r#"
            SELECT
            m.id,
            m.title,
            m.description,
            m.order_index,
            m.visible,
            COALESCE(
                json_agg(
                    json_build_object(
                        'id', l.id,
                        'title', l.title,
                        'order_index', l.order_index,
                        'visible', l.visible,
                        'completed', lr.id IS NOT NULL
                    )
                    ORDER BY l.order_index
                ) FILTER (WHERE l.id IS NOT NULL AND ($2 OR l.visible)),
                '[]'
            ) AS lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id
            LEFT JOIN lesson_reads lr
            ON lr.lesson_id = l.id
            AND lr.user_id = $1
            WHERE ($2 OR m.visible)
            GROUP BY m.id
            ORDER BY m.order_index;
        "#,
        )
        .bind(actor.user_id())
        .bind(include_hidden)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    pub async fn fetch_one(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        module_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let include_hidden = actor.is_teacher();
        let row = sqlx::query_as(
            r#"
            SELECT
            m.id,
            m.title,
            m.description,
            m.order_index,
            m.visible,
            COALESCE(
                json_agg(
                    json_build_object(
                        'id', l.id,
                        'title', l.title,
                        'order_index', l.order_index,
                        'visible', l.visible,
                        'completed', lr.id IS NOT NULL
                    )
                    ORDER BY l.order_index
                ) FILTER (WHERE l.id IS NOT NULL AND ($2 OR l.visible)),
                '[]'
            ) AS lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id
            LEFT JOIN lesson_reads lr
            ON lr.lesson_id = l.id
            AND lr.user_id = $1
            WHERE m.id = $3 AND ($2 OR m.visible)
            GROUP BY m.id;
        "#,
        )
        .bind(actor.user_id())
        .bind(include_hidden)
        .bind(module_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }
}

/// Per-module read counts for one user, feeding the dashboard progress bars.
#[derive(sqlx::FromRow)]
pub struct ModuleProgressRow {
    pub module_id: Uuid,
    pub title: String,
    pub total_lessons: i64,
    pub read_lessons: i64,
}

impl ModuleProgressRow {
    pub async fn fetch_for_user(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let include_hidden = actor.is_teacher();
        let rows = sqlx::query_as(
            r#"
            SELECT
                m.id AS module_id,
                m.title,
                COUNT(l.id) FILTER (WHERE $2 OR l.visible) AS total_lessons,
                COUNT(lr.id) FILTER (WHERE $2 OR l.visible) AS read_lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id
            LEFT JOIN lesson_reads lr
                ON lr.lesson_id = l.id AND lr.user_id = $1
            WHERE $2 OR m.visible
            GROUP BY m.id
            ORDER BY m.order_index
            "#,
        )
        .bind(actor.user_id())
        .bind(include_hidden)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
