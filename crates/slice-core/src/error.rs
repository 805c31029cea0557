use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::response::ApiResponse;

/// Standard error type for the Slice backend.
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Validation errors")]
    ValidationErrors(Vec<FieldError>),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl SliceError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SliceError::NotFound(_) => StatusCode::NOT_FOUND,
            SliceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SliceError::Forbidden(_) => StatusCode::FORBIDDEN,
            SliceError::Conflict(_) => StatusCode::CONFLICT,
            SliceError::Validation(_) => StatusCode::BAD_REQUEST,
            SliceError::ValidationErrors(_) => StatusCode::BAD_REQUEST,
            SliceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            SliceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SliceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            SliceError::NotFound(_) => "NOT_FOUND",
            SliceError::Unauthorized(_) => "UNAUTHORIZED",
            SliceError::Forbidden(_) => "FORBIDDEN",
            SliceError::Conflict(_) => "CONFLICT",
            SliceError::Validation(_) => "VALIDATION_ERROR",
            SliceError::ValidationErrors(_) => "VALIDATION_ERROR",
            SliceError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            SliceError::Internal(_) => "INTERNAL_ERROR",
            SliceError::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to a client. Internal failures are genericized.
    pub fn public_message(&self) -> String {
        match self {
            SliceError::Internal(_) | SliceError::Database(_) => {
                "Internal server error".to_string()
            }
            SliceError::ValidationErrors(errs) => errs
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

/// Error detail for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Field-level validation error.
///
/// ```json
/// {
///   "field": "email",
///   "message": "must be a valid email address",
///   "code": "email"
/// }
/// ```
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

impl From<validator::ValidationErrors> for SliceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        SliceError::ValidationErrors(fields)
    }
}

fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    out.push(FieldError::with_code(&path, message, err.code.to_string()));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

impl axum::response::IntoResponse for SliceError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let fields = match &self {
            SliceError::ValidationErrors(errs) => Some(errs.clone()),
            _ => None,
        };
        let body: ApiResponse<()> = ApiResponse {
            status,
            success: false,
            message: Some(self.public_message()),
            count: None,
            data: None,
            error: Some(ErrorDetail {
                code: self.error_code().to_string(),
                fields,
            }),
        };
        body.into_response()
    }
}
