use axum::routing::get;
use axum::Router;

use crate::controllers::{self, AppState};
use crate::error::SliceError;

/// Build the `/api` routes.
///
/// ```text
/// /api/health            liveness probe
/// /api/auth/...          account lifecycle
/// /api/menu/...          catalog
/// /api/cart              cart re-pricing
/// /api/order/...         checkout and history
/// ```
pub fn build_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(controllers::health::health))
        .nest("/api/auth", controllers::auth::routes())
        .nest("/api/menu", controllers::menu::routes())
        .nest("/api/cart", controllers::cart::routes())
        .nest("/api/order", controllers::order::routes())
}

/// Fallback for unmatched paths.
pub async fn not_found() -> SliceError {
    SliceError::NotFound("Route not found".to_string())
}
