use super::jwt::{AuthError, JwtVerifier, Principal};
use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Extract the token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// JWT authentication middleware
///
/// Rejects the request with 401 unless it carries a valid bearer token,
/// so handlers behind it never run for anonymous callers. The resolved
/// [`Principal`] is stored in the request extensions.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::auth::{JwtVerifier, jwt_auth_middleware};
///
/// let verifier = Arc::new(JwtVerifier::new(&config)?);
///
/// let protected_routes = Router::new()
///     .route("/users", get(list_users))
///     .layer(axum::middleware::from_fn_with_state(verifier, jwt_auth_middleware));
/// ```
pub async fn jwt_auth_middleware(
    State(verifier): State<Arc<JwtVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;

    let principal = verifier.verify(token).inspect_err(|e| {
        tracing::debug!(error = %e, path = %request.uri().path(), "JWT verification failed");
    })?;

    tracing::debug!(subject = %principal.subject, "Authenticated request");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Handlers behind [`jwt_auth_middleware`] can take the caller as an argument
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
