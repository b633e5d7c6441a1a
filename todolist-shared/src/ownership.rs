/// Ownership-scoped CRUD over nested resources
///
/// Every operation takes the caller's [`Identity`] and a [`ResourcePath`] of
/// identifiers (list → task → subtask). Before touching the target, each
/// ancestor in the path is resolved with a single-hop containment check against
/// its immediate parent, starting at the caller's user ID:
///
/// ```text
/// user ∋ list ∋ task ∋ subtask
/// ```
///
/// A broken link anywhere in the chain yields [`ScopeError::NotFound`] for the
/// kind at that level. Resources owned by someone else are therefore
/// indistinguishable from resources that do not exist.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use todolist_shared::auth::middleware::Identity;
/// use todolist_shared::models::{ListInput, Task, TaskInput, TodoList};
/// use todolist_shared::ownership::{ResourcePath, ResourceService};
/// use todolist_shared::pagination::{PageQuery, PaginationConfig};
/// use todolist_shared::store::memory::InMemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = ResourceService::new(Arc::new(InMemoryStore::new()), PaginationConfig::default());
/// let me = Identity::new(Uuid::new_v4(), "me@example.com");
///
/// let input = ListInput { name: "Groceries".into(), description: None };
/// let list: TodoList = service.create(&me, &ResourcePath::root(), input).await?;
///
/// let tasks = service
///     .list::<Task>(&me, &ResourcePath::from([list.id]), PageQuery::default())
///     .await?;
/// assert!(tasks.items.is_empty());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::middleware::Identity;
use crate::models::{Resource, ResourceKind};
use crate::pagination::{Page, PageQuery, PaginationConfig, PaginationError};
use crate::store::{Store, StoreError};

/// Ordered identifiers addressing a resource or a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePath {
    ids: Vec<Uuid>,
}

impl ResourcePath {
    /// The empty path: the caller's own lists
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(ids: Vec<Uuid>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// This path extended by one identifier
    pub fn child(&self, id: Uuid) -> Self {
        let mut ids = self.ids.clone();
        ids.push(id);
        Self { ids }
    }
}

impl From<Vec<Uuid>> for ResourcePath {
    fn from(ids: Vec<Uuid>) -> Self {
        Self::new(ids)
    }
}

impl<const N: usize> From<[Uuid; N]> for ResourcePath {
    fn from(ids: [Uuid; N]) -> Self {
        Self::new(ids.to_vec())
    }
}

/// Error type for scoped operations
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Target or an ancestor is missing or not owned by the caller
    #[error("{0} not found")]
    NotFound(ResourceKind),

    /// Path has the wrong number of identifiers for the operation
    #[error("malformed path for {kind}: expected {expected} identifiers, got {actual}")]
    MalformedPath {
        kind: ResourceKind,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    InvalidPage(#[from] PaginationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD service enforcing per-user ownership of the whole hierarchy
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn Store>,
    pagination: PaginationConfig,
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("backend", &self.store.backend())
            .field("pagination", &self.pagination)
            .finish()
    }
}

impl ResourceService {
    pub fn new(store: Arc<dyn Store>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    /// One page of the children of the collection at `parent`
    pub async fn list<R: Resource>(
        &self,
        identity: &Identity,
        parent: &ResourcePath,
        query: PageQuery,
    ) -> Result<Page<R>, ScopeError> {
        let ancestors = expect_len(parent, R::KIND, R::KIND.depth())?;
        let page = self.pagination.resolve(query)?;
        let parent_id = self.resolve_chain(identity, ancestors).await?;

        let items = R::scope(self.store.as_ref()).page(parent_id, page).await?;

        Ok(Page {
            items,
            page_number: page.page_number,
            items_per_page: page.items_per_page,
        })
    }

    /// The resource at `path`
    pub async fn get<R: Resource>(
        &self,
        identity: &Identity,
        path: &ResourcePath,
    ) -> Result<R, ScopeError> {
        let (ancestors, id) = split_target(path, R::KIND)?;
        let parent_id = self.resolve_chain(identity, ancestors).await?;

        R::scope(self.store.as_ref())
            .find(parent_id, id)
            .await?
            .ok_or_else(|| not_found(identity, R::KIND, id))
    }

    /// Creates a resource under the collection at `parent`
    pub async fn create<R: Resource>(
        &self,
        identity: &Identity,
        parent: &ResourcePath,
        input: R::Input,
    ) -> Result<R, ScopeError> {
        let ancestors = expect_len(parent, R::KIND, R::KIND.depth())?;
        let parent_id = self.resolve_chain(identity, ancestors).await?;

        let created = R::scope(self.store.as_ref()).insert(parent_id, input).await?;

        tracing::info!(
            kind = %R::KIND,
            id = %created.id(),
            parent_id = %parent_id,
            user_id = %identity.user_id,
            "Resource created"
        );
        Ok(created)
    }

    /// Updates the resource at `path`, matched by its own ID and its parent's
    pub async fn update<R: Resource>(
        &self,
        identity: &Identity,
        path: &ResourcePath,
        input: R::Input,
    ) -> Result<R, ScopeError> {
        let (ancestors, id) = split_target(path, R::KIND)?;
        let parent_id = self.resolve_chain(identity, ancestors).await?;

        let updated = R::scope(self.store.as_ref())
            .update(parent_id, id, input)
            .await?
            .ok_or_else(|| not_found(identity, R::KIND, id))?;

        tracing::info!(kind = %R::KIND, id = %id, user_id = %identity.user_id, "Resource updated");
        Ok(updated)
    }

    /// Deletes the resource at `path` and returns its last state
    pub async fn delete<R: Resource>(
        &self,
        identity: &Identity,
        path: &ResourcePath,
    ) -> Result<R, ScopeError> {
        let (ancestors, id) = split_target(path, R::KIND)?;
        let parent_id = self.resolve_chain(identity, ancestors).await?;

        let deleted = R::scope(self.store.as_ref())
            .delete(parent_id, id)
            .await?
            .ok_or_else(|| not_found(identity, R::KIND, id))?;

        tracing::info!(kind = %R::KIND, id = %id, user_id = %identity.user_id, "Resource deleted");
        Ok(deleted)
    }

    /// Walks `ancestors` from the caller down, returning the last resolved ID
    ///
    /// With no ancestors the caller's user ID is the parent.
    async fn resolve_chain(
        &self,
        identity: &Identity,
        ancestors: &[Uuid],
    ) -> Result<Uuid, ScopeError> {
        let mut parent_id = identity.user_id;

        for (depth, &id) in ancestors.iter().enumerate() {
            let kind = ResourceKind::at_depth(depth).ok_or(ScopeError::MalformedPath {
                kind: ResourceKind::Subtask,
                expected: ResourceKind::Subtask.depth() + 1,
                actual: ancestors.len(),
            })?;

            if !self.contains(kind, parent_id, id).await? {
                return Err(not_found(identity, kind, id));
            }
            parent_id = id;
        }

        Ok(parent_id)
    }

    async fn contains(
        &self,
        kind: ResourceKind,
        parent_id: Uuid,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let store = self.store.as_ref();
        match kind {
            ResourceKind::List => store.lists().contains(parent_id, id).await,
            ResourceKind::Task => store.tasks().contains(parent_id, id).await,
            ResourceKind::Subtask => store.subtasks().contains(parent_id, id).await,
        }
    }
}

fn expect_len(
    path: &ResourcePath,
    kind: ResourceKind,
    expected: usize,
) -> Result<&[Uuid], ScopeError> {
    if path.len() == expected {
        Ok(path.ids())
    } else {
        Err(ScopeError::MalformedPath {
            kind,
            expected,
            actual: path.len(),
        })
    }
}

fn split_target(path: &ResourcePath, kind: ResourceKind) -> Result<(&[Uuid], Uuid), ScopeError> {
    let ids = expect_len(path, kind, kind.depth() + 1)?;
    match ids.split_last() {
        Some((&id, ancestors)) => Ok((ancestors, id)),
        None => Err(ScopeError::MalformedPath {
            kind,
            expected: kind.depth() + 1,
            actual: 0,
        }),
    }
}

fn not_found(identity: &Identity, kind: ResourceKind, id: Uuid) -> ScopeError {
    tracing::debug!(kind = %kind, id = %id, user_id = %identity.user_id, "Not found in caller's hierarchy");
    ScopeError::NotFound(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListInput, Subtask, SubtaskInput, Task, TaskInput, TodoList};
    use crate::store::memory::InMemoryStore;
    use std::collections::HashSet;

    fn service() -> ResourceService {
        ResourceService::new(Arc::new(InMemoryStore::new()), PaginationConfig::default())
    }

    fn someone() -> Identity {
        let id = Uuid::new_v4();
        Identity::new(id, format!("{id}@example.com"))
    }

    fn list_input(name: &str, description: Option<&str>) -> ListInput {
        ListInput {
            name: name.to_string(),
            description: description.map(str::to_string),
        }
    }

    fn task_input(name: &str) -> TaskInput {
        TaskInput {
            name: name.to_string(),
            description: None,
            due_date: None,
            is_complete: None,
        }
    }

    fn subtask_input(name: &str) -> SubtaskInput {
        SubtaskInput {
            name: name.to_string(),
            description: None,
            due_date: None,
        }
    }

    async fn new_list(service: &ResourceService, owner: &Identity, name: &str) -> TodoList {
        service
            .create(owner, &ResourcePath::root(), list_input(name, None))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let service = service();
        let me = someone();

        let created: TodoList = service
            .create(&me, &ResourcePath::root(), list_input("Groceries", Some("weekly")))
            .await
            .unwrap();
        assert_eq!(created.user_id, me.user_id);

        let fetched: TodoList = service.get(&me, &ResourcePath::from([created.id])).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_other_user_cannot_touch_list() {
        let service = service();
        let owner = someone();
        let intruder = someone();
        let list = new_list(&service, &owner, "Mine").await;
        let path = ResourcePath::from([list.id]);

        let err = service.get::<TodoList>(&intruder, &path).await.unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::List)));

        let err = service
            .update::<TodoList>(&intruder, &path, list_input("Hijacked", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::List)));

        let err = service.delete::<TodoList>(&intruder, &path).await.unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::List)));

        let err = service
            .create::<Task>(&intruder, &path, task_input("sneaky"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::List)));

        let unchanged: TodoList = service.get(&owner, &path).await.unwrap();
        assert_eq!(unchanged, list);

        let visible = service
            .list::<TodoList>(&intruder, &ResourcePath::root(), PageQuery::default())
            .await
            .unwrap();
        assert!(visible.items.is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let service = service();
        let me = someone();
        let list: TodoList = service
            .create(&me, &ResourcePath::root(), list_input("Groceries", Some("weekly")))
            .await
            .unwrap();
        let path = ResourcePath::from([list.id]);

        let updated: TodoList = service
            .update(&me, &path, list_input("Shopping", None))
            .await
            .unwrap();

        assert_eq!(updated.id, list.id);
        assert_eq!(updated.name, "Shopping");
        assert_eq!(updated.description.as_deref(), Some("weekly"));
        assert_eq!(updated.date_created, list.date_created);
        assert!(updated.date_modified >= list.date_modified);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let service = service();
        let me = someone();
        let list = new_list(&service, &me, "Temp").await;
        let path = ResourcePath::from([list.id]);

        let deleted: TodoList = service.delete(&me, &path).await.unwrap();
        assert_eq!(deleted.id, list.id);

        for _ in 0..2 {
            let err = service.delete::<TodoList>(&me, &path).await.unwrap_err();
            assert!(matches!(err, ScopeError::NotFound(ResourceKind::List)));
        }
    }

    #[tokio::test]
    async fn test_task_addressed_through_sibling_list_is_not_found() {
        let service = service();
        let me = someone();
        let l1 = new_list(&service, &me, "L1").await;
        let l2 = new_list(&service, &me, "L2").await;

        let task: Task = service
            .create(&me, &ResourcePath::from([l1.id]), task_input("Milk"))
            .await
            .unwrap();

        let wrong = ResourcePath::from([l2.id, task.id]);
        let err = service
            .update::<Task>(&me, &wrong, task_input("Eggs"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::Task)));

        let err = service.delete::<Task>(&me, &wrong).await.unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::Task)));

        let intact: Task = service
            .get(&me, &ResourcePath::from([l1.id, task.id]))
            .await
            .unwrap();
        assert_eq!(intact.name, "Milk");
    }

    #[tokio::test]
    async fn test_tasks_listed_per_specific_list() {
        let service = service();
        let me = someone();
        let l1 = new_list(&service, &me, "L1").await;
        let l2 = new_list(&service, &me, "L2").await;

        let _: Task = service
            .create(&me, &ResourcePath::from([l1.id]), task_input("in l1"))
            .await
            .unwrap();
        let _: Task = service
            .create(&me, &ResourcePath::from([l2.id]), task_input("in l2"))
            .await
            .unwrap();

        let page = service
            .list::<Task>(&me, &ResourcePath::from([l2.id]), PageQuery::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "in l2");
        assert_eq!(page.items[0].list_id, l2.id);
    }

    #[tokio::test]
    async fn test_subtask_chain_checks_every_hop() {
        let service = service();
        let me = someone();
        let intruder = someone();
        let list = new_list(&service, &me, "L").await;
        let task: Task = service
            .create(&me, &ResourcePath::from([list.id]), task_input("t"))
            .await
            .unwrap();
        let task_path = ResourcePath::from([list.id, task.id]);
        let subtask: Subtask = service
            .create(&me, &task_path, subtask_input("s"))
            .await
            .unwrap();
        assert_eq!(subtask.task_id, task.id);

        let full = task_path.child(subtask.id);
        let fetched: Subtask = service.get(&me, &full).await.unwrap();
        assert_eq!(fetched.id, subtask.id);

        let err = service.get::<Subtask>(&intruder, &full).await.unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::List)));

        let bogus_task = ResourcePath::from([list.id, Uuid::new_v4(), subtask.id]);
        let err = service.get::<Subtask>(&me, &bogus_task).await.unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::Task)));

        let updated: Subtask = service
            .update(&me, &full, subtask_input("renamed"))
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
    }

    #[tokio::test]
    async fn test_pagination_second_page() {
        let service = service();
        let me = someone();
        for i in 0..15 {
            new_list(&service, &me, &format!("list {i}")).await;
        }

        let first = service
            .list::<TodoList>(&me, &ResourcePath::root(), PageQuery::new(1, 10))
            .await
            .unwrap();
        let second = service
            .list::<TodoList>(&me, &ResourcePath::root(), PageQuery::new(2, 10))
            .await
            .unwrap();

        assert_eq!(first.items.len(), 10);
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.page_number, 2);

        let first_ids: HashSet<Uuid> = first.items.iter().map(|l| l.id).collect();
        assert!(second.items.iter().all(|l| !first_ids.contains(&l.id)));
    }

    #[tokio::test]
    async fn test_page_size_capped_and_zero_rejected() {
        let service = ResourceService::new(
            Arc::new(InMemoryStore::new()),
            PaginationConfig {
                default_page_size: 10,
                max_page_size: 3,
            },
        );
        let me = someone();
        for i in 0..5 {
            new_list(&service, &me, &format!("list {i}")).await;
        }

        let page = service
            .list::<TodoList>(&me, &ResourcePath::root(), PageQuery::new(1, 1000))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items_per_page, 3);

        let err = service
            .list::<TodoList>(&me, &ResourcePath::root(), PageQuery::new(0, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::InvalidPage(PaginationError::InvalidPageNumber)));
    }

    #[tokio::test]
    async fn test_malformed_paths_rejected() {
        let service = service();
        let me = someone();

        let err = service
            .list::<Task>(&me, &ResourcePath::root(), PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScopeError::MalformedPath { kind: ResourceKind::Task, expected: 1, actual: 0 }
        ));

        let err = service
            .get::<TodoList>(&me, &ResourcePath::root())
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::MalformedPath { expected: 1, actual: 0, .. }));

        let too_long = ResourcePath::from([Uuid::new_v4(), Uuid::new_v4()]);
        let err = service.delete::<TodoList>(&me, &too_long).await.unwrap_err();
        assert!(matches!(err, ScopeError::MalformedPath { expected: 1, actual: 2, .. }));
    }

    #[tokio::test]
    async fn test_deleting_list_removes_descendants() {
        let service = service();
        let me = someone();
        let list = new_list(&service, &me, "L").await;
        let task: Task = service
            .create(&me, &ResourcePath::from([list.id]), task_input("t"))
            .await
            .unwrap();
        let _: Subtask = service
            .create(&me, &ResourcePath::from([list.id, task.id]), subtask_input("s"))
            .await
            .unwrap();

        let _: TodoList = service.delete(&me, &ResourcePath::from([list.id])).await.unwrap();

        let err = service
            .list::<Subtask>(&me, &ResourcePath::from([list.id, task.id]), PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(ResourceKind::List)));
    }

    #[test]
    fn test_path_child() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let path = ResourcePath::root().child(a).child(b);
        assert_eq!(path.ids(), &[a, b]);
        assert_eq!(path.len(), 2);
        assert!(ResourcePath::root().is_empty());
    }
}
