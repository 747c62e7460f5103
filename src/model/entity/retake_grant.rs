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
pub struct RetakeGrant {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    allowed: i32,
    granted_by: Uuid,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for RetakeGrant {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::RetakeGrant
    }
}

impl RetakeGrant {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn allowed(&self) -> i32 {
        self.allowed
    }

    pub fn granted_by(&self) -> Uuid {
        self.granted_by
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RetakeGrantCreate {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub allowed: i32,
}

#[async_trait]
impl CrudRepository<RetakeGrant, RetakeGrantCreate, uuid::Uuid> for RetakeGrant {
    /// Grants are keyed by (user, quiz); creating again overwrites the counter.
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: RetakeGrantCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO retake_grants (id, user_id, quiz_id, allowed, granted_by)
            VALUES ($1,$2,$3,$4,$5)
            ON CONFLICT (user_id, quiz_id)
            DO UPDATE SET allowed = EXCLUDED.allowed, granted_by = EXCLUDED.granted_by, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.quiz_id)
        .bind(data.allowed)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: RetakeGrantCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE retake_grants SET allowed = $1, updated_at = now() WHERE id = $2")
            .bind(data.allowed)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.allowed = data.allowed;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM retake_grants WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM retake_grants WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM retake_grants LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM retake_grants")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(RetakeGrant, RetakeGrantCreate, Uuid);

#[async_trait]
impl HasOwner for RetakeGrant {
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

impl RetakeGrant {
    /// Burn one allowed attempt. Returns the remaining count, or None when
    /// there was nothing left to consume.
    pub async fn consume(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> DatabaseResult<Option<i32>> {
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE retake_grants
            SET allowed = allowed - 1, updated_at = now()
            WHERE user_id = $1 AND quiz_id = $2 AND allowed > 0
            RETURNING allowed
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(remaining)
    }

    pub async fn revoke(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM retake_grants WHERE user_id = $1 AND quiz_id = $2")
            .bind(user_id)
            .bind(quiz_id)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as("SELECT * FROM retake_grants WHERE quiz_id = $1")
            .bind(quiz_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }
}
