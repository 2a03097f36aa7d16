/// Task service
///
/// Listing, creation, full-replacement update and deletion of tasks.
///
/// # Visibility
///
/// - `normal` callers see the tasks assigned to them
/// - `admin` callers see tasks whose assignee is a `normal` user accepted by
///   `build_filter(admin scope)`
///
/// # Concurrency
///
/// Updates and deletes are written conditionally on the version read at the
/// start of the call. A concurrent writer that got there first turns this
/// call into `Conflict` (or `NotFound` if the task was deleted).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{resolve_actor, validate_input};
use crate::auth::authorization::require_admin;
use crate::auth::middleware::Identity;
use crate::error::{CoreError, CoreResult};
use crate::hierarchy::{build_filter, resolve_scope};
use crate::lifecycle::{apply_update, authorize_create, authorize_delete, TaskUpdate};
use crate::models::task::{Task, TaskQuery, TaskView};
use crate::models::user::{User, UserQuery};
use crate::store::{Store, StoreError};

/// Create-task request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewTask {
    /// Task name
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    /// Assignee
    pub assigned_to: Uuid,
}

/// Task operations over a store
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    /// Creates a service over `store`
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Lists the tasks visible to the caller, enriched with display names
    pub async fn list(&self, identity: &Identity) -> CoreResult<Vec<TaskView>> {
        let query = if identity.is_admin() {
            let actor = resolve_actor(self.store.as_ref(), identity).await?;
            TaskQuery::assignee_matching(UserQuery::normal_users_within(build_filter(
                &actor.scope,
            )))
        } else {
            TaskQuery::assigned_to(identity.user_id)
        };

        let tasks = self.store.get_tasks_where(&query).await?;
        debug!(user_id = %identity.user_id, count = tasks.len(), "Listed tasks");

        let mut names = NameCache::new(self.store.as_ref());
        let mut views = Vec::with_capacity(tasks.len());
        for task in tasks {
            let assigned_by_name = names
                .get(task.assigned_by)
                .await?
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "task {} references missing user {}",
                        task.id, task.assigned_by
                    ))
                })?;

            // best effort: an unknown verifier renders as empty
            let verified_by_name = match task.verified_by {
                Some(verifier) => names.get(verifier).await.ok().flatten().unwrap_or_default(),
                None => String::new(),
            };

            views.push(TaskView {
                task,
                assigned_by_name,
                verified_by_name,
            });
        }

        Ok(views)
    }

    /// Creates a task for `request.assigned_to`
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the caller is not an admin or the assignee is out of scope
    /// - `NotFound` if the assignee does not exist
    /// - `InvalidInput` if the name is empty
    pub async fn create(&self, identity: &Identity, request: NewTask) -> CoreResult<Task> {
        require_admin(identity.role)?;
        validate_input(&request)?;

        let actor = resolve_actor(self.store.as_ref(), identity).await?;
        let assignee_scope = resolve_scope(self.store.as_ref(), request.assigned_to).await?;

        let data = authorize_create(&actor, request.assigned_to, &assignee_scope, request.name)?;
        let task = self.store.insert_task(data).await?;

        info!(
            task_id = %task.id,
            assigned_to = %task.assigned_to,
            assigned_by = %task.assigned_by,
            "Task created"
        );

        Ok(task)
    }

    /// Applies a full-replacement update
    ///
    /// The request carries the complete desired task; see
    /// [`crate::lifecycle::apply_update`] for the rules. A request equal to
    /// the stored task returns it without writing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task (or a new assignee) does not exist
    /// - `Forbidden` if the caller may not make the change
    /// - `InvalidTransition` for an illegal flag change
    /// - `Conflict` if another write landed first
    pub async fn update(&self, identity: &Identity, desired: TaskUpdate) -> CoreResult<Task> {
        validate_input(&desired)?;

        let actor = resolve_actor(self.store.as_ref(), identity).await?;
        let stored = self.load_task(desired.id).await?;

        let current_scope = if identity.is_admin() {
            resolve_scope(self.store.as_ref(), stored.assigned_to).await?
        } else {
            actor.scope
        };
        let requested_scope = if identity.is_admin() && desired.assigned_to != stored.assigned_to
        {
            Some(resolve_scope(self.store.as_ref(), desired.assigned_to).await?)
        } else {
            None
        };

        let next = apply_update(
            &actor,
            &stored,
            &current_scope,
            requested_scope.as_ref(),
            &desired,
        )
        .map_err(|e| {
            warn!(user_id = %actor.user_id, task_id = %stored.id, error = %e, "Task update rejected");
            e
        })?;

        if desired.is_noop(&stored) {
            debug!(task_id = %stored.id, "Task update is a no-op");
            return Ok(stored);
        }

        let written = self
            .store
            .put_task(&next)
            .await
            .map_err(|e| lost_race(e, identity, stored.id))?;

        info!(
            task_id = %written.id,
            user_id = %identity.user_id,
            completed = written.completed,
            verified = written.verified,
            version = written.version,
            "Task updated"
        );

        Ok(written)
    }

    /// Deletes a task
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the caller is not an admin containing the assignee
    /// - `NotFound` if the task does not exist
    /// - `Conflict` if the task changed since it was read
    pub async fn delete(&self, identity: &Identity, task_id: Uuid) -> CoreResult<()> {
        require_admin(identity.role)?;

        let actor = resolve_actor(self.store.as_ref(), identity).await?;
        let stored = self.load_task(task_id).await?;
        let assignee_scope = resolve_scope(self.store.as_ref(), stored.assigned_to).await?;

        authorize_delete(&actor, &assignee_scope)?;

        self.store
            .delete_task(stored.id, stored.version)
            .await
            .map_err(|e| lost_race(e, identity, stored.id))?;

        info!(task_id = %task_id, user_id = %identity.user_id, "Task deleted");

        Ok(())
    }

    async fn load_task(&self, task_id: Uuid) -> CoreResult<Task> {
        self.store
            .get_task(task_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", task_id)))
    }
}

fn lost_race(err: StoreError, identity: &Identity, task_id: Uuid) -> CoreError {
    if matches!(err, StoreError::Conflict(_) | StoreError::NotFound(_)) {
        warn!(task_id = %task_id, user_id = %identity.user_id, error = %err, "Lost write race");
    }

    match err {
        StoreError::NotFound(_) => CoreError::NotFound(format!("task {}", task_id)),
        other => other.into(),
    }
}

/// Per-request display-name lookups
struct NameCache<'a> {
    store: &'a dyn Store,
    names: HashMap<Uuid, Option<String>>,
}

impl<'a> NameCache<'a> {
    fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            names: HashMap::new(),
        }
    }

    async fn get(&mut self, user_id: Uuid) -> CoreResult<Option<String>> {
        if let Some(name) = self.names.get(&user_id) {
            return Ok(name.clone());
        }

        let name = self
            .store
            .get_user(user_id)
            .await?
            .as_ref()
            .map(User::display_name);
        self.names.insert(user_id, name.clone());

        Ok(name)
    }
}
