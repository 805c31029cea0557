//! Coarse request-level pre-authentication with a shared `x-api-key`.
//!
//! Applied to the whole router. Signup, login, the health probe and the
//! API docs are exempt.
//!
//! ```rust,ignore
//! router.layer(axum::middleware::from_fn_with_state(state, api_key_gate))
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::controllers::AppState;
use crate::error::SliceError;

pub const API_KEY_HEADER: &str = "x-api-key";

const PUBLIC_PATHS: &[&str] = &["/api/auth/signup", "/api/auth/login", "/api/health"];
const PUBLIC_PREFIXES: &[&str] = &["/api-docs"];

/// Whether a request path bypasses the API-key gate.
pub fn is_public_path(path: &str) -> bool {
    let path = path.trim_end_matches('/');
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Compare two keys without short-circuiting on the first differing byte.
pub fn keys_match(expected: &str, presented: &str) -> bool {
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Middleware rejecting requests without the configured API key.
pub async fn api_key_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, SliceError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    if is_public_path(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!(path = %req.uri().path(), "request without x-api-key header");
            SliceError::Unauthorized("Missing x-api-key header".to_string())
        })?;

    if !keys_match(expected, presented) {
        tracing::warn!(path = %req.uri().path(), "invalid x-api-key");
        return Err(SliceError::Forbidden("Invalid API key".to_string()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_login_and_health_are_public() {
        assert!(is_public_path("/api/auth/signup"));
        assert!(is_public_path("/api/auth/login/"));
        assert!(is_public_path("/api/health"));
        assert!(is_public_path("/api-docs/openapi.json"));
    }

    #[test]
    fn everything_else_is_gated() {
        assert!(!is_public_path("/api/auth/logout"));
        assert!(!is_public_path("/api/menu"));
        assert!(!is_public_path("/api/auth/signup-admin"));
    }

    #[test]
    fn keys_match_requires_exact_equality() {
        assert!(keys_match("abc123", "abc123"));
        assert!(!keys_match("abc123", "abc124"));
        assert!(!keys_match("abc123", "abc1234"));
        assert!(!keys_match("abc123", ""));
    }
}
