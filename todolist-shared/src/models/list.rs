/// List model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lists (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description VARCHAR(255),
///     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     date_modified TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Every query takes the owning `user_id`, so a list belonging to someone else
/// is indistinguishable from one that does not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Resource, ResourceKind};
use crate::pagination::PageRequest;
use crate::store::{ResourceStore, Store};

/// To-do list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Attributes accepted for a list
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListInput {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "description must be 1-255 characters"))]
    pub description: Option<String>,
}

impl TodoList {
    /// Builds an unsaved list for `user_id`
    pub fn new(user_id: Uuid, input: ListInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: input.name,
            description: input.description,
            date_created: now,
            date_modified: now,
        }
    }

    /// Applies an update in place; omitted optional fields are kept
    pub fn apply(&mut self, input: ListInput) {
        self.name = input.name;
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        self.date_modified = Utc::now().max(self.date_modified);
    }

    /// Lists owned by `user_id`, oldest first
    pub async fn page_for_user(
        pool: &PgPool,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TodoList>(
            r#"
            SELECT id, user_id, name, description, date_created, date_modified
            FROM lists
            WHERE user_id = $1
            ORDER BY date_created ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TodoList>(
            r#"
            SELECT id, user_id, name, description, date_created, date_modified
            FROM lists
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists_for_user(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lists WHERE id = $1 AND user_id = $2)")
                .bind(id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    pub async fn create(pool: &PgPool, user_id: Uuid, input: ListInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TodoList>(
            r#"
            INSERT INTO lists (user_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, description, date_created, date_modified
            "#,
        )
        .bind(user_id)
        .bind(input.name)
        .bind(input.description)
        .fetch_one(pool)
        .await
    }

    /// Updates a list if `user_id` owns it
    pub async fn update_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: ListInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TodoList>(
            r#"
            UPDATE lists
            SET name = $3,
                description = COALESCE($4, description),
                date_modified = GREATEST(NOW(), date_modified)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, description, date_created, date_modified
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(input.name)
        .bind(input.description)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a list (and, through the foreign keys, its tasks and subtasks)
    pub async fn delete_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TodoList>(
            r#"
            DELETE FROM lists
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, description, date_created, date_modified
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}

impl Resource for TodoList {
    const KIND: ResourceKind = ResourceKind::List;
    type Input = ListInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn scope(store: &dyn Store) -> &dyn ResourceStore<Self> {
        store.lists()
    }
}
