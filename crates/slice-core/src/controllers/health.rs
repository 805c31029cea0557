use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::ApiResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Liveness probe. Exempt from the API-key gate.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Server is running", body = ApiResponse<HealthStatus>)),
    tag = "health"
)]
pub async fn health() -> ApiResponse<HealthStatus> {
    ApiResponse::success(HealthStatus {
        status: "Server is running".to_string(),
        timestamp: Utc::now(),
    })
}
