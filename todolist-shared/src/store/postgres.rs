/// PostgreSQL repository
///
/// Thin adapter over the query functions on the model types. Unique violations
/// surface as [`StoreError::Conflict`]; cascading deletes are left to the
/// foreign keys declared in the migrations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::pool::health_check;
use crate::models::{
    CreateUser, ListInput, Subtask, SubtaskInput, Task, TaskInput, TodoList, User,
};
use crate::pagination::PageRequest;
use crate::store::{ResourceStore, Store, StoreError, UserStore};

/// Store backed by a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }
}

#[async_trait]
impl ResourceStore<TodoList> for PgStore {
    async fn page(&self, user_id: Uuid, page: PageRequest) -> Result<Vec<TodoList>, StoreError> {
        Ok(TodoList::page_for_user(&self.pool, user_id, page).await?)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<TodoList>, StoreError> {
        Ok(TodoList::find_for_user(&self.pool, user_id, id).await?)
    }

    async fn contains(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        Ok(TodoList::exists_for_user(&self.pool, user_id, id).await?)
    }

    async fn insert(&self, user_id: Uuid, input: ListInput) -> Result<TodoList, StoreError> {
        Ok(TodoList::create(&self.pool, user_id, input).await?)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: ListInput,
    ) -> Result<Option<TodoList>, StoreError> {
        Ok(TodoList::update_for_user(&self.pool, user_id, id, input).await?)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<TodoList>, StoreError> {
        Ok(TodoList::delete_for_user(&self.pool, user_id, id).await?)
    }
}

#[async_trait]
impl ResourceStore<Task> for PgStore {
    async fn page(&self, list_id: Uuid, page: PageRequest) -> Result<Vec<Task>, StoreError> {
        Ok(Task::page_in_list(&self.pool, list_id, page).await?)
    }

    async fn find(&self, list_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_in_list(&self.pool, list_id, id).await?)
    }

    async fn contains(&self, list_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::exists_in_list(&self.pool, list_id, id).await?)
    }

    async fn insert(&self, list_id: Uuid, input: TaskInput) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, list_id, input).await?)
    }

    async fn update(
        &self,
        list_id: Uuid,
        id: Uuid,
        input: TaskInput,
    ) -> Result<Option<Task>, StoreError> {
        Ok(Task::update_in_list(&self.pool, list_id, id, input).await?)
    }

    async fn delete(&self, list_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::delete_in_list(&self.pool, list_id, id).await?)
    }
}

#[async_trait]
impl ResourceStore<Subtask> for PgStore {
    async fn page(&self, task_id: Uuid, page: PageRequest) -> Result<Vec<Subtask>, StoreError> {
        Ok(Subtask::page_in_task(&self.pool, task_id, page).await?)
    }

    async fn find(&self, task_id: Uuid, id: Uuid) -> Result<Option<Subtask>, StoreError> {
        Ok(Subtask::find_in_task(&self.pool, task_id, id).await?)
    }

    async fn insert(&self, task_id: Uuid, input: SubtaskInput) -> Result<Subtask, StoreError> {
        Ok(Subtask::create(&self.pool, task_id, input).await?)
    }

    async fn update(
        &self,
        task_id: Uuid,
        id: Uuid,
        input: SubtaskInput,
    ) -> Result<Option<Subtask>, StoreError> {
        Ok(Subtask::update_in_task(&self.pool, task_id, id, input).await?)
    }

    async fn delete(&self, task_id: Uuid, id: Uuid) -> Result<Option<Subtask>, StoreError> {
        Ok(Subtask::delete_in_task(&self.pool, task_id, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn lists(&self) -> &dyn ResourceStore<TodoList> {
        self
    }

    fn tasks(&self) -> &dyn ResourceStore<Task> {
        self
    }

    fn subtasks(&self) -> &dyn ResourceStore<Subtask> {
        self
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
