/// In-memory repository
///
/// Tables are plain vectors behind a single `tokio::sync::RwLock`, kept in
/// insertion order so pages come back oldest first like the SQL adapter.
/// Deletes cascade the same way the PostgreSQL foreign keys do.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    CreateUser, ListInput, Subtask, SubtaskInput, Task, TaskInput, TodoList, User,
};
use crate::pagination::PageRequest;
use crate::store::{ResourceStore, Store, StoreError, UserStore, USERS_EMAIL_KEY};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    lists: Vec<TodoList>,
    tasks: Vec<Task>,
    subtasks: Vec<Subtask>,
}

/// Store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T: Clone>(rows: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    rows.skip(offset).take(limit).collect()
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(USERS_EMAIL_KEY.to_string()));
        }

        let user = User::new(data);
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ResourceStore<TodoList> for InMemoryStore {
    async fn page(&self, user_id: Uuid, page: PageRequest) -> Result<Vec<TodoList>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables.lists.iter().filter(|l| l.user_id == user_id).cloned();
        Ok(window(rows, page))
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<TodoList>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .lists
            .iter()
            .find(|l| l.id == id && l.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, user_id: Uuid, input: ListInput) -> Result<TodoList, StoreError> {
        let list = TodoList::new(user_id, input);
        self.tables.write().await.lists.push(list.clone());
        Ok(list)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: ListInput,
    ) -> Result<Option<TodoList>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .lists
            .iter_mut()
            .find(|l| l.id == id && l.user_id == user_id)
            .map(|list| {
                list.apply(input);
                list.clone()
            }))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<TodoList>, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(index) = tables
            .lists
            .iter()
            .position(|l| l.id == id && l.user_id == user_id)
        else {
            return Ok(None);
        };
        let list = tables.lists.remove(index);

        let task_ids: HashSet<Uuid> = tables
            .tasks
            .iter()
            .filter(|t| t.list_id == list.id)
            .map(|t| t.id)
            .collect();
        tables.tasks.retain(|t| t.list_id != list.id);
        tables.subtasks.retain(|s| !task_ids.contains(&s.task_id));

        Ok(Some(list))
    }
}

#[async_trait]
impl ResourceStore<Task> for InMemoryStore {
    async fn page(&self, list_id: Uuid, page: PageRequest) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables.tasks.iter().filter(|t| t.list_id == list_id).cloned();
        Ok(window(rows, page))
    }

    async fn find(&self, list_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .find(|t| t.id == id && t.list_id == list_id)
            .cloned())
    }

    async fn insert(&self, list_id: Uuid, input: TaskInput) -> Result<Task, StoreError> {
        let task = Task::new(list_id, input);
        self.tables.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn update(
        &self,
        list_id: Uuid,
        id: Uuid,
        input: TaskInput,
    ) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.list_id == list_id)
            .map(|task| {
                task.apply(input);
                task.clone()
            }))
    }

    async fn delete(&self, list_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(index) = tables
            .tasks
            .iter()
            .position(|t| t.id == id && t.list_id == list_id)
        else {
            return Ok(None);
        };
        let task = tables.tasks.remove(index);
        tables.subtasks.retain(|s| s.task_id != task.id);

        Ok(Some(task))
    }
}

#[async_trait]
impl ResourceStore<Subtask> for InMemoryStore {
    async fn page(&self, task_id: Uuid, page: PageRequest) -> Result<Vec<Subtask>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables.subtasks.iter().filter(|s| s.task_id == task_id).cloned();
        Ok(window(rows, page))
    }

    async fn find(&self, task_id: Uuid, id: Uuid) -> Result<Option<Subtask>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subtasks
            .iter()
            .find(|s| s.id == id && s.task_id == task_id)
            .cloned())
    }

    async fn insert(&self, task_id: Uuid, input: SubtaskInput) -> Result<Subtask, StoreError> {
        let subtask = Subtask::new(task_id, input);
        self.tables.write().await.subtasks.push(subtask.clone());
        Ok(subtask)
    }

    async fn update(
        &self,
        task_id: Uuid,
        id: Uuid,
        input: SubtaskInput,
    ) -> Result<Option<Subtask>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .subtasks
            .iter_mut()
            .find(|s| s.id == id && s.task_id == task_id)
            .map(|subtask| {
                subtask.apply(input);
                subtask.clone()
            }))
    }

    async fn delete(&self, task_id: Uuid, id: Uuid) -> Result<Option<Subtask>, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(index) = tables
            .subtasks
            .iter()
            .position(|s| s.id == id && s.task_id == task_id)
        else {
            return Ok(None);
        };

        Ok(Some(tables.subtasks.remove(index)))
    }
}

#[async_trait]
impl Store for InMemoryStore {
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
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
