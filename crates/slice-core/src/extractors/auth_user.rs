use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth;
use crate::config::Config;
use crate::error::SliceError;
use crate::models::Role;

/// Extractor that validates the bearer JWT and carries the caller's identity.
///
/// Usage in handlers:
/// ```rust,ignore
/// async fn history(user: AuthUser) -> impl IntoResponse {
///     // user.id, user.email, user.role come from the token claims
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = SliceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| SliceError::Unauthorized("No token provided".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SliceError::Unauthorized("No token provided".to_string()))?;

        let config = parts
            .extensions
            .get::<Arc<Config>>()
            .ok_or_else(|| SliceError::Internal("Config not found in request".to_string()))?;

        let claims = auth::validate_token(token, &config.jwt_secret)?;

        let id: i32 = claims
            .sub
            .parse()
            .map_err(|_| SliceError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}
