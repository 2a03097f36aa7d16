/// Task lifecycle state machine
///
/// A task's state is derived from its two flags:
///
/// ```text
///             completed=true           verified=true
/// Assigned  ─────────────────▶ Completed ─────────────▶ Verified
///           ◀─────────────────           ◀─────────────
///             completed=false          verified=false
/// ```
///
/// `Assigned → Verified` and `Verified → Assigned` are not single steps.
/// `(completed=false, verified=true)` is never a valid state and is
/// rejected as an invalid transition whenever it is requested.
///
/// Updates carry the complete desired task. [`apply_update`] diffs that
/// against the stored record field by field, checks who may make each
/// change, and returns the record to write. Nothing here performs I/O; the
/// caller resolves scopes beforehand and persists the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::{require_within_scope, Actor, AuthzError};
use crate::hierarchy::Scope;
use crate::models::task::{CreateTask, Task};

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not yet done
    Assigned,

    /// Reported done by the assignee or an admin
    Completed,

    /// Completion confirmed by an admin
    Verified,
}

impl TaskStatus {
    /// Maps a flag pair to a state
    ///
    /// # Errors
    ///
    /// `LifecycleError::InvalidTransition` for `verified` without `completed`
    pub fn from_flags(completed: bool, verified: bool) -> Result<Self, LifecycleError> {
        match (completed, verified) {
            (false, false) => Ok(TaskStatus::Assigned),
            (true, false) => Ok(TaskStatus::Completed),
            (true, true) => Ok(TaskStatus::Verified),
            (false, true) => Err(LifecycleError::InvalidTransition(
                "a task cannot be verified before it is completed".to_string(),
            )),
        }
    }

    /// State of a stored task
    pub fn of(task: &Task) -> Self {
        match (task.completed, task.verified) {
            (_, true) => TaskStatus::Verified,
            (true, false) => TaskStatus::Completed,
            (false, false) => TaskStatus::Assigned,
        }
    }

    /// Whether a single update may move from `self` to `target`
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        use TaskStatus::*;

        match (self, target) {
            (Assigned, Completed) | (Completed, Assigned) => true,
            (Completed, Verified) | (Verified, Completed) => true,
            (from, to) => *from == to,
        }
    }

    /// Converts state to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Assigned => "assigned",
            TaskStatus::Completed => "completed",
            TaskStatus::Verified => "verified",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for lifecycle decisions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The actor may not make the requested change
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// The requested flag combination is not a legal change
    #[error("{0}")]
    InvalidTransition(String),
}

/// Complete desired state of a task, as sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    /// Task to update
    pub id: Uuid,

    /// Desired name
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Desired assignee
    pub assigned_to: Uuid,

    /// Desired completed flag
    pub completed: bool,

    /// Desired verified flag
    pub verified: bool,
}

impl TaskUpdate {
    /// Desired state equal to the stored task
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            assigned_to: task.assigned_to,
            completed: task.completed,
            verified: task.verified,
        }
    }

    /// True if no field differs from `stored`
    pub fn is_noop(&self, stored: &Task) -> bool {
        self.name == stored.name
            && self.assigned_to == stored.assigned_to
            && self.completed == stored.completed
            && self.verified == stored.verified
    }

    fn reassigns(&self, stored: &Task) -> bool {
        self.assigned_to != stored.assigned_to
    }
}

/// Authorizes task creation and builds the insert record
///
/// The actor must be an admin whose scope contains the assignee.
pub fn authorize_create(
    actor: &Actor,
    assignee: Uuid,
    assignee_scope: &Scope,
    name: String,
) -> Result<CreateTask, LifecycleError> {
    require_within_scope(actor, assignee_scope)?;

    Ok(CreateTask {
        name,
        assigned_to: assignee,
        assigned_by: actor.user_id,
    })
}

/// Authorizes deletion of a task held by a user with `assignee_scope`
pub fn authorize_delete(actor: &Actor, assignee_scope: &Scope) -> Result<(), LifecycleError> {
    require_within_scope(actor, assignee_scope)?;
    Ok(())
}

/// Applies a full-replacement update to `stored`
///
/// `current_scope` is the scope of the stored assignee. `requested_scope`
/// is the scope of `desired.assigned_to` and must be supplied whenever the
/// update reassigns the task.
///
/// Authorization is checked before transition legality:
///
/// - a `normal` actor must be the assignee and may only change `completed`
/// - an `admin` actor must contain the current assignee, and the new
///   assignee too when reassigning
///
/// The returned task has `verified_by` set to the actor when entering
/// `Verified` and cleared when leaving it. Its `version` is unchanged; the
/// store bumps it on write.
pub fn apply_update(
    actor: &Actor,
    stored: &Task,
    current_scope: &Scope,
    requested_scope: Option<&Scope>,
    desired: &TaskUpdate,
) -> Result<Task, LifecycleError> {
    authorize_update(actor, stored, current_scope, requested_scope, desired)?;

    let from = TaskStatus::of(stored);
    let to = TaskStatus::from_flags(desired.completed, desired.verified)?;
    if !from.can_transition_to(to) {
        return Err(LifecycleError::InvalidTransition(format!(
            "cannot move a task from {} to {}",
            from, to
        )));
    }

    let verified_by = match (from, to) {
        (TaskStatus::Verified, TaskStatus::Verified) => stored.verified_by,
        (_, TaskStatus::Verified) => Some(actor.user_id),
        _ => None,
    };

    Ok(Task {
        name: desired.name.clone(),
        assigned_to: desired.assigned_to,
        completed: desired.completed,
        verified: desired.verified,
        verified_by,
        ..stored.clone()
    })
}

fn authorize_update(
    actor: &Actor,
    stored: &Task,
    current_scope: &Scope,
    requested_scope: Option<&Scope>,
    desired: &TaskUpdate,
) -> Result<(), AuthzError> {
    if !actor.role.is_admin() {
        if stored.assigned_to != actor.user_id {
            return Err(AuthzError::NotAssignee);
        }
        if desired.name != stored.name
            || desired.assigned_to != stored.assigned_to
            || desired.verified != stored.verified
        {
            return Err(AuthzError::FieldImmutable);
        }
        return Ok(());
    }

    require_within_scope(actor, current_scope)?;

    if desired.reassigns(stored) {
        let target = requested_scope.ok_or(AuthzError::OutOfScope)?;
        require_within_scope(actor, target)?;
    }

    Ok(())
}
