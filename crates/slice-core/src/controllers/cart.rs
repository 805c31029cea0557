use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::SliceError;
use crate::extractors::Json;
use crate::response::ApiResponse;
use crate::services::cart::{self, CartSummary, ItemRequest};

use super::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CartRequest {
    #[validate(nested)]
    pub items: Vec<ItemRequest>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(validate_cart))
}

/// Re-price a client-side cart against current prices and stock.
#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = CartRequest,
    responses(
        (status = 200, description = "Priced cart", body = ApiResponse<CartSummary>),
        (status = 400, description = "Unknown product or not enough stock")
    ),
    security(("api_key" = [])),
    tag = "cart"
)]
pub async fn validate_cart(
    State(state): State<AppState>,
    Json(payload): Json<CartRequest>,
) -> Result<ApiResponse<CartSummary>, SliceError> {
    let priced = cart::price_items(&state.db, &payload.items).await?;
    Ok(ApiResponse::success(CartSummary::from(&priced)))
}
