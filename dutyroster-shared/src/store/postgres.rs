//! PostgreSQL store backed by the model operations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskQuery, TaskStore, UserQuery, UserStore};
use crate::db::pool::health_check;
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Store over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Resolves a failed conditional write into `NotFound` or `Conflict`
    async fn missed_write(&self, id: Uuid) -> StoreError {
        match Task::exists(&self.pool, id).await {
            Ok(true) => StoreError::Conflict(id),
            Ok(false) => StoreError::NotFound(id),
            Err(err) => StoreError::persistence(err),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        User::find_by_id(&self.pool, id)
            .await
            .map_err(StoreError::persistence)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        User::find_by_username(&self.pool, username)
            .await
            .map_err(StoreError::persistence)
    }

    async fn get_users_where(&self, query: &UserQuery) -> StoreResult<Vec<User>> {
        User::list_where(&self.pool, query)
            .await
            .map_err(StoreError::persistence)
    }

    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let username = data.username.clone();
        User::create(&self.pool, data).await.map_err(|err| {
            if is_unique_violation(&err, USERNAME_CONSTRAINT) {
                StoreError::Duplicate {
                    field: "username",
                    value: username,
                }
            } else {
                StoreError::persistence(err)
            }
        })
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Task::find_by_id(&self.pool, id)
            .await
            .map_err(StoreError::persistence)
    }

    async fn get_tasks_where(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        Task::list_where(&self.pool, query)
            .await
            .map_err(StoreError::persistence)
    }

    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let assignee = data.assigned_to;
        Task::create(&self.pool, data).await.map_err(|err| {
            let missing_user = matches!(
                &err,
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation()
            );
            if missing_user {
                StoreError::NotFound(assignee)
            } else {
                StoreError::persistence(err)
            }
        })
    }

    async fn put_task(&self, task: &Task) -> StoreResult<Task> {
        match Task::update_if_version(&self.pool, task)
            .await
            .map_err(StoreError::persistence)?
        {
            Some(updated) => Ok(updated),
            None => Err(self.missed_write(task.id).await),
        }
    }

    async fn delete_task(&self, id: Uuid, expected_version: i64) -> StoreResult<()> {
        let deleted = Task::delete_if_version(&self.pool, id, expected_version)
            .await
            .map_err(StoreError::persistence)?;

        if deleted {
            Ok(())
        } else {
            Err(self.missed_write(id).await)
        }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }
}
