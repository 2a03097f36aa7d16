/// Scope resolution
///
/// Looks up a user's hierarchy placement. The lookup is a plain read with no
/// caching, so it can be repeated within one request (once for the actor and
/// once per target of a mutating task operation).

use tracing::debug;
use uuid::Uuid;

use super::scope::Scope;
use crate::error::{CoreError, CoreResult};
use crate::store::UserStore;

/// Resolves the scope descriptor for `user_id`
///
/// # Errors
///
/// - `CoreError::NotFound` if the user does not exist
/// - `CoreError::Internal` if the store fails
pub async fn resolve_scope<S>(store: &S, user_id: Uuid) -> CoreResult<Scope>
where
    S: UserStore + ?Sized,
{
    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("user {}", user_id)))?;

    debug!(user_id = %user_id, scope = %user.scope, "Resolved scope");

    Ok(user.scope)
}
