use axum::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ErrorDetail;

/// Standard API response wrapper.
///
/// All Slice endpoints return this format:
/// ```json
/// {
///   "success": true,
///   "message": "Order placed successfully",
///   "data": { ... }
/// }
/// ```
/// List endpoints also carry `count`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        ApiResponse {
            status: StatusCode::OK,
            success: true,
            message: None,
            count: None,
            data: Some(data),
            error: None,
        }
    }

    /// Create a `201 Created` response with data.
    pub fn created(data: T) -> Self {
        ApiResponse {
            status: StatusCode::CREATED,
            ..Self::success(data)
        }
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Create a successful list response; `count` mirrors the list length.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        ApiResponse {
            count: Some(count),
            ..Self::success(items)
        }
    }
}

impl ApiResponse<()> {
    /// A successful response that carries only a message.
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            status: StatusCode::OK,
            success: true,
            message: Some(message.into()),
            count: None,
            data: None,
            error: None,
        }
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = self.status;
        (status, axum::Json(self)).into_response()
    }
}
