/// Repository interface
///
/// Storage is reached only through these traits. Every nested-resource method
/// is keyed by the immediate parent's ID, so a store never answers "does this
/// ID exist anywhere"; it answers "does this ID exist under that parent".
///
/// # Adapters
///
/// - [`postgres::PgStore`]: sqlx / PostgreSQL, SQL lives on the model types
/// - [`memory::InMemoryStore`]: `RwLock`ed tables for tests and local runs
///
/// # Example
///
/// ```
/// use todolist_shared::store::{memory::InMemoryStore, Store};
///
/// let store = InMemoryStore::new();
/// assert_eq!(store.backend(), "memory");
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CreateUser, Resource, Subtask, Task, TodoList, User};
use crate::pagination::PageRequest;

pub mod memory;
pub mod postgres;

/// Constraint backing user email uniqueness
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated; carries the constraint name
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // 23505 = unique_violation
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// Account persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; a taken email yields [`StoreError::Conflict`]
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// Persistence for one kind of nested resource
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// Children of `parent_id`, ordered by creation time then ID
    async fn page(&self, parent_id: Uuid, page: PageRequest) -> Result<Vec<R>, StoreError>;

    async fn find(&self, parent_id: Uuid, id: Uuid) -> Result<Option<R>, StoreError>;

    /// Single-hop containment check: is `id` a child of `parent_id`?
    async fn contains(&self, parent_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.find(parent_id, id).await?.is_some())
    }

    async fn insert(&self, parent_id: Uuid, input: R::Input) -> Result<R, StoreError>;

    /// Applies `input` to the child matching both IDs; `None` if there is none
    async fn update(&self, parent_id: Uuid, id: Uuid, input: R::Input)
        -> Result<Option<R>, StoreError>;

    /// Removes the child matching both IDs (and its descendants)
    async fn delete(&self, parent_id: Uuid, id: Uuid) -> Result<Option<R>, StoreError>;
}

/// A complete storage backend
#[async_trait]
pub trait Store: UserStore + Send + Sync {
    fn lists(&self) -> &dyn ResourceStore<TodoList>;

    fn tasks(&self) -> &dyn ResourceStore<Task>;

    fn subtasks(&self) -> &dyn ResourceStore<Subtask>;

    /// Short backend name reported by the health check
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
