/// Request-level orchestration
///
/// Each service method takes the caller's [`Identity`] explicitly and runs
/// the full decision pipeline:
///
/// ```text
/// Identity → resolve actor scope → contains / build_filter → lifecycle → store
/// ```
///
/// All lookups and authorization checks finish before the first write, so a
/// failed call leaves the store untouched.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dutyroster_shared::auth::middleware::Identity;
/// use dutyroster_shared::models::user::Role;
/// use dutyroster_shared::services::tasks::TaskService;
/// use dutyroster_shared::store::memory::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = TaskService::new(Arc::new(MemoryStore::new()));
/// let views = service.list(&Identity::new(Uuid::new_v4(), Role::Normal)).await?;
/// assert!(views.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod accounts;
pub mod tasks;
pub mod users;

use validator::{Validate, ValidationErrors};

use crate::auth::authorization::Actor;
use crate::auth::middleware::Identity;
use crate::error::{CoreError, CoreResult};
use crate::store::Store;

pub use accounts::{AccountService, AuthSettings, LoginRequest, RegisterRequest, Session};
pub use tasks::{NewTask, TaskService};
pub use users::{UserProfile, UserService};

/// Resolves the caller into an actor with scope
///
/// A valid credential whose user no longer exists is treated as
/// unauthenticated.
pub(crate) async fn resolve_actor(store: &dyn Store, identity: &Identity) -> CoreResult<Actor> {
    let user = store
        .get_user(identity.user_id)
        .await?
        .ok_or(CoreError::Unauthenticated)?;

    Ok(Actor::new(identity.user_id, identity.role, user.scope))
}

/// Runs `validator` checks, folding failures into `CoreError::InvalidInput`
pub(crate) fn validate_input<T: Validate>(input: &T) -> CoreResult<()> {
    input
        .validate()
        .map_err(|errors| CoreError::InvalidInput(validation_message(&errors)))
}

/// One-line summary of field errors, sorted by field name
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let reason = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{}: {}", field, reason)
        })
        .collect();
    fields.sort();
    fields.join("; ")
}
