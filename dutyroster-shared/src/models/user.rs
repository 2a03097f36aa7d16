/// User model and database operations
///
/// Users carry a role and a position in the unit/depot/platoon/section
/// hierarchy. The position is flattened into four integer columns; admins
/// may store `-1` (wildcard) in any of them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'normal');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(64) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL,
///     unit INTEGER NOT NULL,
///     depot INTEGER NOT NULL,
///     platoon INTEGER NOT NULL,
///     section INTEGER NOT NULL,
///     man INTEGER NOT NULL DEFAULT 0,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     rank VARCHAR(50) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use dutyroster_shared::hierarchy::Scope;
/// use dutyroster_shared::models::user::{CreateUser, Role, User};
/// use dutyroster_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser::new("jdoe", "$argon2id$...", Role::Normal, Scope::new(1, 2, 5, 9))
///     .with_profile("John", "Doe", "CPL");
///
/// let user = User::create(&pool, new_user).await?;
/// println!("Created user: {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::hierarchy::{Scope, ScopeFilter};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Assigns and verifies tasks within a delegated scope
    Admin,

    /// Views and completes their own tasks
    Normal,
}

impl Role {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Normal => "normal",
        }
    }

    /// Whether this role administers other users
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Account role
    pub role: Role,

    /// Hierarchy placement
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub scope: Scope,

    /// Position within the section (descriptive only)
    pub man: i32,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Rank abbreviation
    pub rank: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display string used when enriching task listings, e.g. `"CPL John Doe"`
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.rank, self.first_name, self.last_name)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Account role
    pub role: Role,

    /// Hierarchy placement
    pub scope: Scope,

    /// Position within the section
    pub man: i32,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Rank abbreviation
    pub rank: String,
}

impl CreateUser {
    /// Creates input with an empty profile
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        scope: Scope,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            scope,
            man: 0,
            first_name: String::new(),
            last_name: String::new(),
            rank: String::new(),
        }
    }

    /// Sets the descriptive profile fields
    pub fn with_profile(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        rank: impl Into<String>,
    ) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self.rank = rank.into();
        self
    }
}

/// Selection criteria for listing users
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// Restrict to one role
    pub role: Option<Role>,

    /// Restrict to scopes accepted by this filter
    pub scope: Option<ScopeFilter>,
}

impl UserQuery {
    /// Normal users within the filter's scope
    pub fn normal_users_within(filter: ScopeFilter) -> Self {
        Self {
            role: Some(Role::Normal),
            scope: Some(filter),
        }
    }

    /// In-memory evaluation, equivalent to the SQL rendering
    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |role| user.role == role)
            && self
                .scope
                .as_ref()
                .map_or(true, |filter| filter.matches(&user.scope))
    }

    /// Appends ` AND ...` conditions on the `users` table aliased as `alias`
    pub(crate) fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>, alias: &str) {
        if let Some(role) = self.role {
            qb.push(format!(" AND {}.role = ", alias)).push_bind(role);
        }
        if let Some(filter) = &self.scope {
            for &(level, value) in filter.constraints() {
                qb.push(format!(" AND {}.{} = ", alias, level.as_str()))
                    .push_bind(value);
            }
        }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, role, unit, depot, platoon, section, \
                            man, first_name, last_name, rank, created_at, updated_at";

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username already exists (unique constraint `users_username_key`)
    /// - A check constraint on the scope columns fails
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, role, unit, depot, platoon, section,
                               man, first_name, last_name, rank)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.scope.unit)
        .bind(data.scope.depot)
        .bind(data.scope.platoon)
        .bind(data.scope.section)
        .bind(data.man)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.rank)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by login name
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists users matching `query`, ordered by username
    ///
    /// Scope constraints are sent as bound parameters.
    pub async fn list_where(pool: &PgPool, query: &UserQuery) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM users u WHERE TRUE",
            USER_COLUMNS
                .split(", ")
                .map(|c| format!("u.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        query.push_conditions(&mut qb, "u");
        qb.push(" ORDER BY u.username");

        qb.build_query_as::<User>().fetch_all(pool).await
    }
}
