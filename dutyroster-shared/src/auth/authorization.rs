/// Role and scope guards
///
/// Every authorization decision in the services goes through these helpers.
/// Role is always checked first and independently of scope: a `normal` user
/// whose placement happens to equal an admin's never gains admin rights.
///
/// # Example
///
/// ```
/// use dutyroster_shared::auth::authorization::{require_admin, require_within_scope, Actor};
/// use dutyroster_shared::hierarchy::{Scope, WILDCARD};
/// use dutyroster_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let actor = Actor::new(Uuid::new_v4(), Role::Admin, Scope::new(1, WILDCARD, WILDCARD, WILDCARD));
///
/// assert!(require_admin(actor.role).is_ok());
/// assert!(require_within_scope(&actor, &Scope::new(1, 2, 5, 9)).is_ok());
/// assert!(require_within_scope(&actor, &Scope::new(2, 2, 5, 9)).is_err());
/// ```

use tracing::warn;
use uuid::Uuid;

use crate::hierarchy::{contains, Scope};
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Operation is reserved for admins
    #[error("admin role required")]
    NotAdmin,

    /// Target lies outside the admin's scope
    #[error("target is outside your scope")]
    OutOfScope,

    /// Normal users may only act on their own tasks
    #[error("task is not assigned to you")]
    NotAssignee,

    /// Normal users may only toggle `completed`
    #[error("only the completed flag may be changed")]
    FieldImmutable,
}

/// Acting user with resolved scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID
    pub user_id: Uuid,

    /// Role from the credential
    pub role: Role,

    /// Placement from the store
    pub scope: Scope,
}

impl Actor {
    /// Creates an actor
    pub fn new(user_id: Uuid, role: Role, scope: Scope) -> Self {
        Self {
            user_id,
            role,
            scope,
        }
    }
}

/// Fails unless `role` is admin
pub fn require_admin(role: Role) -> Result<(), AuthzError> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::NotAdmin)
    }
}

/// Fails unless `actor` is an admin whose scope contains `target`
pub fn require_within_scope(actor: &Actor, target: &Scope) -> Result<(), AuthzError> {
    require_admin(actor.role)?;

    if !contains(&actor.scope, target) {
        warn!(
            user_id = %actor.user_id,
            scope = %actor.scope,
            target = %target,
            "Target outside admin scope"
        );
        return Err(AuthzError::OutOfScope);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::WILDCARD;

    #[test]
    fn test_require_admin() {
        assert!(require_admin(Role::Admin).is_ok());
        assert_eq!(require_admin(Role::Normal), Err(AuthzError::NotAdmin));
    }

    #[test]
    fn test_normal_role_never_passes_scope_guard() {
        let scope = Scope::new(1, 2, 5, 9);
        let actor = Actor::new(Uuid::new_v4(), Role::Normal, scope);

        assert_eq!(require_within_scope(&actor, &scope), Err(AuthzError::NotAdmin));
    }

    #[test]
    fn test_unit_admin_scope() {
        let actor = Actor::new(
            Uuid::new_v4(),
            Role::Admin,
            Scope::new(1, WILDCARD, WILDCARD, WILDCARD),
        );

        for depot in 1..4 {
            for platoon in 1..4 {
                assert!(require_within_scope(&actor, &Scope::new(1, depot, platoon, 1)).is_ok());
                assert_eq!(
                    require_within_scope(&actor, &Scope::new(2, depot, platoon, 1)),
                    Err(AuthzError::OutOfScope)
                );
            }
        }
    }

    #[test]
    fn test_authz_error_display() {
        assert!(AuthzError::NotAdmin.to_string().contains("admin"));
        assert!(AuthzError::OutOfScope.to_string().contains("scope"));
    }
}
