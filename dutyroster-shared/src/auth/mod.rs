/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: bearer-token resolution into an [`middleware::Identity`]
/// - [`authorization`]: role and scope guards
///
/// # Example
///
/// ```no_run
/// use dutyroster_shared::auth::password::{hash_password, verify_password};
/// use dutyroster_shared::auth::jwt::{create_token, Claims};
/// use dutyroster_shared::auth::middleware::resolve_identity;
/// use dutyroster_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let secret = "secret-key-at-least-32-bytes-long!!";
/// let token = create_token(&Claims::new(Uuid::new_v4(), Role::Normal), secret)?;
/// let header = format!("Bearer {}", token);
/// let identity = resolve_identity(Some(header.as_str()), secret)?;
/// assert_eq!(identity.role, Role::Normal);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
