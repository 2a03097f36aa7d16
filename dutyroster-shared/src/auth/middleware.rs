/// Authentication middleware for Axum
///
/// Resolves the `Authorization: Bearer <token>` header into an [`Identity`]
/// and adds it to the request extensions. Handlers receive the identity with
/// Axum's `Extension` extractor and pass it explicitly to the services.
///
/// Every failure (missing header, wrong scheme, bad signature, expired
/// token, missing claims) produces the same [`IdentityError::Unauthenticated`]
/// response. The specific reason is only logged at debug level.
///
/// # Example
///
/// ```no_run
/// use axum::{Extension, Router, routing::get, middleware};
/// use dutyroster_shared::auth::middleware::{create_jwt_middleware, Identity};
///
/// async fn handler(Extension(identity): Extension<Identity>) -> String {
///     format!("Hello, {} {}!", identity.role, identity.user_id)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(handler))
///     .layer(middleware::from_fn(create_jwt_middleware("secret".to_string())));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::jwt::validate_token;
use crate::models::user::Role;

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role carried by the credential
    pub role: Role,
}

impl Identity {
    /// Creates an identity
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether the caller is an admin
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Error type for authentication middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Missing or invalid credential
    #[error("Authentication required")]
    Unauthenticated,
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "unauthorized",
            "message": self.to_string(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Resolves an `Authorization` header value into an identity
///
/// # Errors
///
/// Returns `IdentityError::Unauthenticated` for any failure
pub fn resolve_identity(
    authorization: Option<&str>,
    secret: &str,
) -> Result<Identity, IdentityError> {
    let header = authorization.ok_or_else(|| {
        debug!("Missing Authorization header");
        IdentityError::Unauthenticated
    })?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        debug!("Authorization header is not a Bearer token");
        IdentityError::Unauthenticated
    })?;

    let claims = validate_token(token.trim(), secret).map_err(|e| {
        debug!(error = %e, "Token rejected");
        IdentityError::Unauthenticated
    })?;

    Ok(Identity::new(claims.id, claims.role))
}

/// JWT authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if the credential cannot be resolved
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, IdentityError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = resolve_identity(authorization, &secret)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Creates a JWT authentication middleware closure
///
/// Helper function that takes ownership of the JWT secret and returns a
/// middleware function. The returned closure borrows nothing from the caller.
pub fn create_jwt_middleware(
    secret: String,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Response, IdentityError>> + Send>,
> + Clone {
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}
