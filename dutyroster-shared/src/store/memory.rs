//! In-memory store for tests and local runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskQuery, TaskStore, UserQuery, UserStore};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

/// Thread-safe in-memory store
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    username_index: HashMap<String, Uuid>,
    tasks: HashMap<Uuid, Task>,
}

impl MemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

impl MemoryState {
    fn task_matches(&self, task: &Task, query: &TaskQuery) -> bool {
        if query.assigned_to.is_some_and(|id| task.assigned_to != id) {
            return false;
        }
        match &query.assignee {
            Some(user_query) => self
                .users
                .get(&task.assigned_to)
                .is_some_and(|user| user_query.matches(user)),
            None => true,
        }
    }

    /// Returns the stored task if `version` is current
    fn checked_task(&mut self, id: Uuid, version: i64) -> StoreResult<&mut Task> {
        let stored = self.tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if stored.version != version {
            return Err(StoreError::Conflict(id));
        }
        Ok(stored)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .username_index
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn get_users_where(&self, query: &UserQuery) -> StoreResult<Vec<User>> {
        let state = self.read()?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| query.matches(user))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.write()?;
        if state.username_index.contains_key(&data.username) {
            return Err(StoreError::Duplicate {
                field: "username",
                value: data.username,
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            password_hash: data.password_hash,
            role: data.role,
            scope: data.scope,
            man: data.man,
            first_name: data.first_name,
            last_name: data.last_name,
            rank: data.rank,
            created_at: now,
            updated_at: now,
        };

        state.username_index.insert(user.username.clone(), user.id);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn get_tasks_where(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| state.task_matches(task, query))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.write()?;
        for user_id in [data.assigned_to, data.assigned_by] {
            if !state.users.contains_key(&user_id) {
                return Err(StoreError::NotFound(user_id));
            }
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            name: data.name,
            assigned_to: data.assigned_to,
            assigned_by: data.assigned_by,
            completed: false,
            verified: false,
            verified_by: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn put_task(&self, task: &Task) -> StoreResult<Task> {
        let mut state = self.write()?;
        let stored = state.checked_task(task.id, task.version)?;

        stored.name = task.name.clone();
        stored.assigned_to = task.assigned_to;
        stored.completed = task.completed;
        stored.verified = task.verified;
        stored.verified_by = task.verified_by;
        stored.version += 1;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete_task(&self, id: Uuid, expected_version: i64) -> StoreResult<()> {
        let mut state = self.write()?;
        state.checked_task(id, expected_version)?;
        state.tasks.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
