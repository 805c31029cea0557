use axum::extract::{FromRequest, Request};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::SliceError;

/// Largest request body buffered for JSON parsing (axum's default limit).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// JSON body extractor that also runs `validator` rules.
///
/// Malformed JSON and failed field rules both reject with 400 in the
/// standard error envelope.
///
/// ```rust,ignore
/// async fn signup(Json(payload): Json<SignupRequest>) -> impl IntoResponse {
///     // payload already passed its #[validate(...)] rules
/// }
/// ```
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = SliceError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| {
                let inner = e.into_inner();
                if inner.downcast_ref::<LengthLimitError>().is_some() {
                    SliceError::PayloadTooLarge(format!(
                        "Request body exceeds {} bytes",
                        MAX_BODY_BYTES
                    ))
                } else {
                    SliceError::Validation(format!("Failed to read body: {}", inner))
                }
            })?;

        let value: T = serde_json::from_slice(&bytes)
            .map_err(|e| SliceError::Validation(format!("Invalid JSON: {}", e)))?;

        value.validate()?;
        Ok(Json(value))
    }
}
