use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};

use crate::error::SliceError;
use crate::models::product::ProductResponse;
use crate::response::ApiResponse;
use crate::services::catalog;

use super::{parse_id, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/category/{category}", get(list_by_category))
        .route("/{product_id}", get(get_product))
}

/// List the whole menu.
#[utoipa::path(
    get,
    path = "/api/menu",
    responses(
        (status = 200, description = "All products", body = ApiResponse<Vec<ProductResponse>>)
    ),
    security(("api_key" = [])),
    tag = "menu"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ProductResponse>>, SliceError> {
    let products = catalog::list_products(&state.db).await?;
    Ok(ApiResponse::list(
        products.into_iter().map(ProductResponse::from).collect(),
    ))
}

/// List products of one category.
#[utoipa::path(
    get,
    path = "/api/menu/category/{category}",
    params(("category" = String, Path, description = "Pizza, Drink or Bread")),
    responses(
        (status = 200, description = "Products in the category", body = ApiResponse<Vec<ProductResponse>>),
        (status = 400, description = "Unknown category")
    ),
    security(("api_key" = [])),
    tag = "menu"
)]
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<ApiResponse<Vec<ProductResponse>>, SliceError> {
    let category = catalog::parse_category(&category)?;
    let products = catalog::list_by_category(&state.db, category).await?;
    Ok(ApiResponse::list(
        products.into_iter().map(ProductResponse::from).collect(),
    ))
}

/// Fetch a single product.
#[utoipa::path(
    get,
    path = "/api/menu/{product_id}",
    params(("product_id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found")
    ),
    security(("api_key" = [])),
    tag = "menu"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<ApiResponse<ProductResponse>, SliceError> {
    let id = parse_id(&product_id, "Product not found")?;
    let product = catalog::get_product(&state.db, id).await?;
    Ok(ApiResponse::success(ProductResponse::from(product)))
}
