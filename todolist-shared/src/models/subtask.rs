/// Subtask model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subtasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description VARCHAR(255),
///     due_date DATE,
///     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     date_modified TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Resource, ResourceKind};
use crate::pagination::PageRequest;
use crate::store::{ResourceStore, Store};

/// Subtask within a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskInput {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "description must be 1-255 characters"))]
    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,
}

impl Subtask {
    pub fn new(task_id: Uuid, input: SubtaskInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_id,
            name: input.name,
            description: input.description,
            due_date: input.due_date,
            date_created: now,
            date_modified: now,
        }
    }

    pub fn apply(&mut self, input: SubtaskInput) {
        self.name = input.name;
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(due_date) = input.due_date {
            self.due_date = Some(due_date);
        }
        self.date_modified = Utc::now().max(self.date_modified);
    }

    pub async fn page_in_task(
        pool: &PgPool,
        task_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            SELECT id, task_id, name, description, due_date, date_created, date_modified
            FROM subtasks
            WHERE task_id = $1
            ORDER BY date_created ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(task_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn find_in_task(
        pool: &PgPool,
        task_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            SELECT id, task_id, name, description, due_date, date_created, date_modified
            FROM subtasks
            WHERE id = $1 AND task_id = $2
            "#,
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, task_id: Uuid, input: SubtaskInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            INSERT INTO subtasks (task_id, name, description, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, name, description, due_date, date_created, date_modified
            "#,
        )
        .bind(task_id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.due_date)
        .fetch_one(pool)
        .await
    }

    pub async fn update_in_task(
        pool: &PgPool,
        task_id: Uuid,
        id: Uuid,
        input: SubtaskInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            UPDATE subtasks
            SET name = $3,
                description = COALESCE($4, description),
                due_date = COALESCE($5, due_date),
                date_modified = GREATEST(NOW(), date_modified)
            WHERE id = $1 AND task_id = $2
            RETURNING id, task_id, name, description, due_date, date_created, date_modified
            "#,
        )
        .bind(id)
        .bind(task_id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.due_date)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_in_task(
        pool: &PgPool,
        task_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            DELETE FROM subtasks
            WHERE id = $1 AND task_id = $2
            RETURNING id, task_id, name, description, due_date, date_created, date_modified
            "#,
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }
}

impl Resource for Subtask {
    const KIND: ResourceKind = ResourceKind::Subtask;
    type Input = SubtaskInput;

    fn id(&self) -> Uuid {
        self.id
    }

    fn scope(store: &dyn Store) -> &dyn ResourceStore<Self> {
        store.subtasks()
    }
}
