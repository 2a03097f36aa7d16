/// User queries
///
/// Profiles are visible to their owner and to admins whose scope contains
/// them. Admin listings enumerate `normal` users through the accessible-set
/// filter rather than by testing every user with the matcher.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::resolve_actor;
use crate::auth::authorization::{require_admin, require_within_scope};
use crate::auth::middleware::Identity;
use crate::error::{CoreError, CoreResult};
use crate::hierarchy::{build_filter, Scope};
use crate::models::user::{Role, User, UserQuery};
use crate::store::Store;

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    /// User ID
    pub id: Uuid,

    /// Login name
    pub username: String,

    /// Role
    #[serde(rename = "type")]
    pub role: Role,

    /// Hierarchy placement
    #[serde(flatten)]
    pub scope: Scope,

    /// Position within the section
    pub man: i32,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Rank abbreviation
    pub rank: String,

    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            scope: user.scope,
            man: user.man,
            first_name: user.first_name,
            last_name: user.last_name,
            rank: user.rank,
            created_at: user.created_at,
        }
    }
}

/// User lookups over a store
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    /// Creates a service over `store`
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Profile of the caller
    pub async fn get_self(&self, identity: &Identity) -> CoreResult<UserProfile> {
        self.store
            .get_user(identity.user_id)
            .await?
            .map(UserProfile::from)
            .ok_or(CoreError::Unauthenticated)
    }

    /// Profile of `user_id`, for an admin whose scope contains it
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the caller is not an admin or the user is out of scope
    /// - `NotFound` if the user does not exist
    pub async fn get_user(&self, identity: &Identity, user_id: Uuid) -> CoreResult<UserProfile> {
        require_admin(identity.role)?;

        let actor = resolve_actor(self.store.as_ref(), identity).await?;
        let target = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("user {}", user_id)))?;

        require_within_scope(&actor, &target.scope)?;

        Ok(target.into())
    }

    /// All `normal` users within the caller's scope
    pub async fn list_accessible(&self, identity: &Identity) -> CoreResult<Vec<UserProfile>> {
        require_admin(identity.role)?;

        let actor = resolve_actor(self.store.as_ref(), identity).await?;
        let filter = build_filter(&actor.scope);
        let users = self
            .store
            .get_users_where(&UserQuery::normal_users_within(filter))
            .await?;

        debug!(user_id = %actor.user_id, count = users.len(), "Listed accessible users");

        Ok(users.into_iter().map(UserProfile::from).collect())
    }
}
