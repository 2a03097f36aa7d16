/// Task model and database operations
///
/// A task is a named unit of work assigned by an admin to a normal user.
/// Its lifecycle is encoded by two flags, `completed` and `verified`, plus
/// the id of the verifying admin. See [`crate::lifecycle`] for the legal
/// combinations and transitions.
///
/// Every row carries a `version` counter starting at 1. Writes are
/// conditional on the version the writer read, so two concurrent mutations
/// of the same task cannot both succeed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     assigned_to UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     verified BOOLEAN NOT NULL DEFAULT FALSE,
///     verified_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     version BIGINT NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (NOT verified OR completed)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use dutyroster_shared::models::task::{CreateTask, Task};
/// use dutyroster_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     name: "Clean rifle".to_string(),
///     assigned_to: Uuid::new_v4(),
///     assigned_by: Uuid::new_v4(),
/// }).await?;
///
/// assert_eq!(task.version, 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::user::UserQuery;

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Human-readable task name
    pub name: String,

    /// Normal user responsible for the task
    pub assigned_to: Uuid,

    /// Admin who created the task
    pub assigned_by: Uuid,

    /// Assignee reports the work as done
    pub completed: bool,

    /// An admin confirmed the completion
    pub verified: bool,

    /// Admin who verified; set exactly when `verified` is true
    pub verified_by: Option<Uuid>,

    /// Optimistic concurrency counter
    pub version: i64,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task name
    pub name: String,

    /// Assignee
    pub assigned_to: Uuid,

    /// Creating admin
    pub assigned_by: Uuid,
}

/// Task enriched with display names for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    /// The task itself
    #[serde(flatten)]
    pub task: Task,

    /// Display name of the assigning admin
    pub assigned_by_name: String,

    /// Display name of the verifying admin, empty when unverified
    pub verified_by_name: String,
}

/// Selection criteria for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Only tasks assigned to this user
    pub assigned_to: Option<Uuid>,

    /// Only tasks whose assignee matches this user query
    pub assignee: Option<UserQuery>,
}

impl TaskQuery {
    /// Tasks assigned to one user
    pub fn assigned_to(user_id: Uuid) -> Self {
        Self {
            assigned_to: Some(user_id),
            assignee: None,
        }
    }

    /// Tasks whose assignee matches `query`
    pub fn assignee_matching(query: UserQuery) -> Self {
        Self {
            assigned_to: None,
            assignee: Some(query),
        }
    }
}

const TASK_COLUMNS: &str = "t.id, t.name, t.assigned_to, t.assigned_by, t.completed, t.verified, \
                            t.verified_by, t.version, t.created_at, t.updated_at";

const RETURNING: &str = "RETURNING id, name, assigned_to, assigned_by, completed, verified, \
                         verified_by, version, created_at, updated_at";

impl Task {
    /// Creates a new task in the assigned state
    ///
    /// # Errors
    ///
    /// Returns an error if either referenced user does not exist or the
    /// database operation fails
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (name, assigned_to, assigned_by) VALUES ($1, $2, $3) {}",
            RETURNING
        ))
        .bind(data.name)
        .bind(data.assigned_to)
        .bind(data.assigned_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks t WHERE t.id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Checks whether a task row exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }

    /// Lists tasks matching `query`, oldest first
    ///
    /// Assignee constraints are applied through a join on `users`.
    pub async fn list_where(pool: &PgPool, query: &TaskQuery) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM tasks t JOIN users u ON u.id = t.assigned_to WHERE TRUE",
            TASK_COLUMNS
        ));

        if let Some(user_id) = query.assigned_to {
            qb.push(" AND t.assigned_to = ").push_bind(user_id);
        }
        if let Some(assignee) = &query.assignee {
            assignee.push_conditions(&mut qb, "u");
        }
        qb.push(" ORDER BY t.created_at, t.id");

        qb.build_query_as::<Task>().fetch_all(pool).await
    }

    /// Writes the mutable fields of `task` if the stored version still equals
    /// `task.version`
    ///
    /// Returns `None` when no row matched, either because the task is gone or
    /// because another writer bumped the version first.
    pub async fn update_if_version(pool: &PgPool, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        let updated = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET name = $2,
                assigned_to = $3,
                completed = $4,
                verified = $5,
                verified_by = $6,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $7
            {}
            "#,
            RETURNING
        ))
        .bind(task.id)
        .bind(&task.name)
        .bind(task.assigned_to)
        .bind(task.completed)
        .bind(task.verified)
        .bind(task.verified_by)
        .bind(task.version)
        .fetch_optional(pool)
        .await?;

        Ok(updated)
    }

    /// Deletes a task if the stored version equals `expected_version`
    pub async fn delete_if_version(
        pool: &PgPool,
        id: Uuid,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
