use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::SliceError;
use crate::extractors::{AuthUser, Json};
use crate::models::order::OrderResponse;
use crate::response::ApiResponse;
use crate::services::cart::ItemRequest;
use crate::services::orders::{self, OrderReceipt};

use super::{parse_id, AppState};

// ── Request types ──

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    #[validate(nested)]
    pub items: Vec<ItemRequest>,
    #[serde(default)]
    pub delivery_address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order))
        .route("/history", get(order_history))
        .route("/{order_id}", get(get_order).put(update_status))
}

// ── Handlers ──

/// Place an order from a list of items.
#[utoipa::path(
    post,
    path = "/api/order",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderReceipt>),
        (status = 400, description = "Empty order, unknown product or not enough stock"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "order"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<ApiResponse<OrderReceipt>, SliceError> {
    let placed =
        orders::place_order(&state.db, user.id, &payload.items, payload.delivery_address).await?;

    orders::send_confirmation(&state.db, state.mailer.as_ref(), &placed).await;

    Ok(ApiResponse::created(placed.receipt()).with_message("Order placed successfully"))
}

/// The caller's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/order/history",
    responses(
        (status = 200, description = "Order history", body = ApiResponse<Vec<OrderResponse>>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "order"
)]
pub async fn order_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<OrderResponse>>, SliceError> {
    let history = orders::order_history(&state.db, user.id).await?;
    Ok(ApiResponse::list(history))
}

/// One of the caller's orders.
#[utoipa::path(
    get,
    path = "/api/order/{order_id}",
    params(("order_id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "order"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> Result<ApiResponse<OrderResponse>, SliceError> {
    let id = parse_id(&order_id, "Order not found")?;
    let order = orders::get_order(&state.db, id, user.id).await?;
    Ok(ApiResponse::success(order))
}

/// Change an order's status. Admins only.
#[utoipa::path(
    put,
    path = "/api/order/{order_id}",
    params(("order_id" = i32, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "order"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<ApiResponse<OrderResponse>, SliceError> {
    let id = parse_id(&order_id, "Order not found")?;
    let order = orders::update_status(&state.db, id, &payload.status, &user.role).await?;
    Ok(ApiResponse::success(order).with_message("Order status updated successfully"))
}
