/// Registration and login
///
/// Both operations return a [`Session`]: a signed token plus the role and id
/// it was issued for. Login failures never say whether the username or the
/// password was wrong.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::validate_input;
use crate::auth::jwt::{issue_token, DEFAULT_EXPIRATION_HOURS};
use crate::auth::password::{hash_password, verify_password, DUMMY_PASSWORD_HASH};
use crate::error::{CoreError, CoreResult};
use crate::hierarchy::Scope;
use crate::models::user::{CreateUser, Role, User};
use crate::store::Store;

/// Token signing settings
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HMAC secret
    pub jwt_secret: String,

    /// Token lifetime in hours
    pub expiration_hours: i64,
}

impl AuthSettings {
    /// Settings with the default lifetime
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
        }
    }
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login name
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: String,

    /// Plaintext password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role
    #[serde(rename = "type")]
    pub role: Role,

    /// Unit, or -1
    #[validate(range(min = -1, message = "Must be -1 or greater"))]
    pub unit: i32,

    /// Depot, or -1
    #[validate(range(min = -1, message = "Must be -1 or greater"))]
    pub depot: i32,

    /// Platoon, or -1
    #[validate(range(min = -1, message = "Must be -1 or greater"))]
    pub platoon: i32,

    /// Section, or -1
    #[validate(range(min = -1, message = "Must be -1 or greater"))]
    pub section: i32,

    /// Position within the section
    #[serde(default)]
    #[validate(range(min = 0, message = "Must not be negative"))]
    pub man: i32,

    /// Given name
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,

    /// Family name
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,

    /// Rank abbreviation
    #[validate(length(min = 1, max = 50, message = "Rank must be 1 to 50 characters"))]
    pub rank: String,
}

impl RegisterRequest {
    /// Hierarchy placement requested
    pub fn scope(&self) -> Scope {
        Scope::new(self.unit, self.depot, self.platoon, self.section)
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login name
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Plaintext password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Issued credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Signed token
    pub jwt: String,

    /// Role the token carries
    #[serde(rename = "type")]
    pub role: Role,

    /// User ID
    pub id: Uuid,
}

/// Account operations over a store
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    settings: AuthSettings,
}

impl AccountService {
    /// Creates a service over `store`
    pub fn new(store: Arc<dyn Store>, settings: AuthSettings) -> Self {
        Self { store, settings }
    }

    /// Registers a user and signs them in
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if a field is invalid or a `normal` user has a wildcard level
    /// - `Conflict` if the username is taken
    pub async fn register(&self, request: RegisterRequest) -> CoreResult<Session> {
        validate_input(&request)?;

        let scope = request.scope();
        if request.role == Role::Normal && !scope.is_concrete() {
            return Err(CoreError::InvalidInput(
                "normal users must have a concrete unit, depot, platoon and section".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let data = CreateUser {
            man: request.man,
            ..CreateUser::new(request.username, password_hash, request.role, scope)
                .with_profile(request.first_name, request.last_name, request.rank)
        };

        let user = self.store.insert_user(data).await?;
        info!(user_id = %user.id, role = %user.role, scope = %user.scope, "User registered");

        self.session_for(&user)
    }

    /// Verifies credentials and signs the user in
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for an unknown username or a wrong password
    pub async fn login(&self, request: LoginRequest) -> CoreResult<Session> {
        validate_input(&request)?;

        let Some(user) = self.store.find_user_by_username(&request.username).await? else {
            // same Argon2 work as a wrong password
            verify_password(&request.password, DUMMY_PASSWORD_HASH)?;
            warn!(username = %request.username, "Login for unknown user");
            return Err(CoreError::Unauthenticated);
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(CoreError::Unauthenticated);
        }

        info!(user_id = %user.id, "User logged in");
        self.session_for(&user)
    }

    fn session_for(&self, user: &User) -> CoreResult<Session> {
        let jwt = issue_token(
            user.id,
            user.role,
            &self.settings.jwt_secret,
            self.settings.expiration_hours,
        )?;

        Ok(Session {
            jwt,
            role: user.role,
            id: user.id,
        })
    }
}
