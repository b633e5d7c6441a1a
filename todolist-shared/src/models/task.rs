/// Task model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     list_id UUID NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description VARCHAR(255),
///     due_date DATE,
///     is_complete BOOLEAN NOT NULL DEFAULT FALSE,
///     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     date_modified TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Queries are keyed by `list_id`; whether the list belongs to the caller is
/// checked one level up.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Resource, ResourceKind};
use crate::pagination::PageRequest;
use crate::store::{ResourceStore, Store};

/// Task within a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub list_id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Calendar date, serialized as `YYYY-MM-DD`
    pub due_date: Option<NaiveDate>,

    pub is_complete: bool,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Attributes accepted for a task
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "description must be 1-255 characters"))]
    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    pub is_complete: Option<bool>,
}

impl Task {
    /// Builds an unsaved task in `list_id`
    pub fn new(list_id: Uuid, input: TaskInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            list_id,
            name: input.name,
            description: input.description,
            due_date: input.due_date,
            is_complete: input.is_complete.unwrap_or(false),
            date_created: now,
            date_modified: now,
        }
    }

    /// Applies an update in place; omitted optional fields are kept
    pub fn apply(&mut self, input: TaskInput) {
        self.name = input.name;
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(due_date) = input.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(is_complete) = input.is_complete {
            self.is_complete = is_complete;
        }
        self.date_modified = Utc::now().max(self.date_modified);
    }

    pub async fn page_in_list(
        pool: &PgPool,
        list_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, list_id, name, description, due_date, is_complete, date_created, date_modified
            FROM tasks
            WHERE list_id = $1
            ORDER BY date_created ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(list_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn find_in_list(
        pool: &PgPool,
        list_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, list_id, name, description, due_date, is_complete, date_created, date_modified
            FROM tasks
            WHERE id = $1 AND list_id = $2
            "#,
        )
        .bind(id)
        .bind(list_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists_in_list(pool: &PgPool, list_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1 AND list_id = $2)")
                .bind(id)
                .bind(list_id)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    pub async fn create(pool: &PgPool, list_id: Uuid, input: TaskInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (list_id, name, description, due_date, is_complete)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, list_id, name, description, due_date, is_complete, date_created, date_modified
            "#,
        )
        .bind(list_id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.due_date)
        .bind(input.is_complete.unwrap_or(false))
        .fetch_one(pool)
        .await
    }

    pub async fn update_in_list(
        pool: &PgPool,
        list_id: Uuid,
        id: Uuid,
        input: TaskInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = $3,
                description = COALESCE($4, description),
                due_date = COALESCE($5, due_date),
                is_complete = COALESCE($6, is_complete),
                date_modified = GREATEST(NOW(), date_modified)
            WHERE id = $1 AND list_id = $2
            RETURNING id, list_id, name, description, due_date, is_complete, date_created, date_modified
            "#,
        )
        .bind(id)
        .bind(list_id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.due_date)
        .bind(input.is_complete)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_in_list(
        pool: &PgPool,
        list_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND list_id = $2
            RETURNING id, list_id, name, description, due_date, is_complete, date_created, date_modified
            "#,
        )
        .bind(id)
        .bind(list_id)
        .fetch_optional(pool)
        .await
    }
}

impl Resource for Task {
    const KIND: ResourceKind = ResourceKind::Task;
    type Input = TaskInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn scope(store: &dyn Store) -> &dyn ResourceStore<Self> {
        store.tasks()
    }
}
