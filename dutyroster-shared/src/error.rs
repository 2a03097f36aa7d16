/// Core error taxonomy
///
/// Every service operation returns [`CoreResult`]. The variants mirror the
/// outcomes a caller has to distinguish; the API layer maps each one to an
/// HTTP status.
///
/// Authorization and lookup failures are raised before any write is issued,
/// so a returned error never implies a partial mutation.

use crate::auth::authorization::AuthzError;
use crate::auth::middleware::IdentityError;
use crate::auth::password::PasswordError;
use crate::auth::jwt::JwtError;
use crate::lifecycle::LifecycleError;
use crate::store::StoreError;

/// Result alias for service operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Error kinds surfaced by the core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or invalid credential
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but role or scope does not allow the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced user or task does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authorized, but the requested field combination is not a legal change
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A concurrent write on the same record won
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed or semantically invalid request data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store or crypto failure; details are logged, not returned to clients
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CoreError::NotFound(format!("record {}", id)),
            StoreError::Conflict(id) => {
                CoreError::Conflict(format!("task {} was modified concurrently", id))
            }
            StoreError::Duplicate { field, value } => {
                CoreError::Conflict(format!("{} '{}' already exists", field, value))
            }
            StoreError::Persistence(inner) => CoreError::Internal(inner.to_string()),
        }
    }
}

impl From<LifecycleError> for CoreError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Forbidden(reason) => CoreError::Forbidden(reason.to_string()),
            LifecycleError::InvalidTransition(msg) => CoreError::InvalidTransition(msg),
        }
    }
}

impl From<AuthzError> for CoreError {
    fn from(err: AuthzError) -> Self {
        CoreError::Forbidden(err.to_string())
    }
}

impl From<IdentityError> for CoreError {
    fn from(_: IdentityError) -> Self {
        CoreError::Unauthenticated
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for CoreError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => CoreError::Internal(msg),
            _ => CoreError::Unauthenticated,
        }
    }
}
