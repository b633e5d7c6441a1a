/// Database models
///
/// The hierarchy is User → List → Task → Subtask. Each nested model carries only
/// its immediate parent's ID; ownership by a user is always transitive.
///
/// # Models
///
/// - `user`: Accounts (email + password hash)
/// - `list`: Lists owned by a user (depth 0)
/// - `task`: Tasks owned by a list (depth 1)
/// - `subtask`: Subtasks owned by a task (depth 2)
///
/// Nested models implement [`Resource`] so the ownership service can treat all
/// three levels uniformly.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::store::{ResourceStore, Store};

pub mod list;
pub mod subtask;
pub mod task;
pub mod user;

pub use list::{ListInput, TodoList};
pub use subtask::{Subtask, SubtaskInput};
pub use task::{Task, TaskInput};
pub use user::{CreateUser, User};

/// Level of a nested resource in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    List,
    Task,
    Subtask,
}

impl ResourceKind {
    /// Number of ancestors between this kind and the owning user
    pub const fn depth(self) -> usize {
        match self {
            ResourceKind::List => 0,
            ResourceKind::Task => 1,
            ResourceKind::Subtask => 2,
        }
    }

    /// Kind found at a given depth, if any
    pub const fn at_depth(depth: usize) -> Option<Self> {
        match depth {
            0 => Some(ResourceKind::List),
            1 => Some(ResourceKind::Task),
            2 => Some(ResourceKind::Subtask),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::List => "List",
            ResourceKind::Task => "Task",
            ResourceKind::Subtask => "Subtask",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A nested, parent-scoped entity
pub trait Resource: Serialize + Clone + Send + Sync + Sized + 'static {
    /// Position in the hierarchy
    const KIND: ResourceKind;

    /// Attributes accepted on create and update
    type Input: DeserializeOwned + Validate + Send + Sync + 'static;

    fn id(&self) -> Uuid;

    /// The repository slice holding this kind
    fn scope(store: &dyn Store) -> &dyn ResourceStore<Self>;
}
