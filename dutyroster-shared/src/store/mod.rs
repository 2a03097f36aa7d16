/// Storage ports
///
/// The services talk to persistence only through [`UserStore`] and
/// [`TaskStore`]. Two adapters are provided:
///
/// - [`memory::MemoryStore`]: process-local maps, used by tests and demos
/// - [`postgres::PgStore`]: PostgreSQL through the model functions
///
/// # Concurrency
///
/// Tasks carry a `version`. [`TaskStore::put_task`] and
/// [`TaskStore::delete_task`] succeed only if the stored version still equals
/// the one the caller read; otherwise they fail with
/// [`StoreError::Conflict`] (row changed) or [`StoreError::NotFound`] (row
/// gone). Of two concurrent mutations that read the same version, at most one
/// is applied.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use crate::models::task::TaskQuery;
pub use crate::models::user::UserQuery;

use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The record does not exist
    #[error("record not found: {0}")]
    NotFound(Uuid),

    /// The record exists but its version moved past the caller's
    #[error("version conflict on {0}")]
    Conflict(Uuid),

    /// A uniqueness constraint was violated
    #[error("duplicate {field}: {value}")]
    Duplicate {
        /// Constrained field
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Persistence-layer failure
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// User persistence contract
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by ID
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Finds a user by login name
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Lists users matching `query`, ordered by username
    async fn get_users_where(&self, query: &UserQuery) -> StoreResult<Vec<User>>;

    /// Stores a new user
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the username is taken.
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;
}

/// Task persistence contract
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Finds a task by ID
    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Lists tasks matching `query`, oldest first
    async fn get_tasks_where(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    /// Stores a new task with version 1
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    /// Replaces the mutable fields of a task
    ///
    /// `task.version` must be the version the caller read. On success the
    /// stored row, with its version incremented, is returned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the task no longer exists
    /// - [`StoreError::Conflict`] if the version has moved
    async fn put_task(&self, task: &Task) -> StoreResult<Task>;

    /// Deletes a task if its version equals `expected_version`
    ///
    /// # Errors
    ///
    /// Same as [`TaskStore::put_task`].
    async fn delete_task(&self, id: Uuid, expected_version: i64) -> StoreResult<()>;
}

/// Combined store used by the services
#[async_trait]
pub trait Store: UserStore + TaskStore {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}
