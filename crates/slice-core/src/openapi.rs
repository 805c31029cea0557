use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::controllers::auth::{
    EmailRequest, LoginRequest, LoginResponse, ResetPasswordRequest, SignupRequest,
};
use crate::controllers::cart::CartRequest;
use crate::controllers::health::HealthStatus;
use crate::controllers::order::{PlaceOrderRequest, UpdateStatusRequest};
use crate::error::{ErrorDetail, FieldError};
use crate::models::order::{OrderResponse, OrderStatus};
use crate::models::order_item::LineItem;
use crate::models::product::{Category, ProductResponse};
use crate::models::user::{Role, UserResponse};
use crate::services::cart::{CartSummary, ItemRequest};
use crate::services::orders::OrderReceipt;

/// OpenAPI document for the Slice API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Slice API",
        version = "0.3.0",
        description = "Food ordering backend: menu, cart, orders and accounts."
    ),
    paths(
        crate::controllers::health::health,
        crate::controllers::auth::signup,
        crate::controllers::auth::login,
        crate::controllers::auth::logout,
        crate::controllers::auth::verify_email,
        crate::controllers::auth::resend_verification,
        crate::controllers::auth::forgot_password,
        crate::controllers::auth::reset_password,
        crate::controllers::menu::list_products,
        crate::controllers::menu::list_by_category,
        crate::controllers::menu::get_product,
        crate::controllers::cart::validate_cart,
        crate::controllers::order::place_order,
        crate::controllers::order::order_history,
        crate::controllers::order::get_order,
        crate::controllers::order::update_status,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            LoginResponse,
            EmailRequest,
            ResetPasswordRequest,
            UserResponse,
            Role,
            ProductResponse,
            Category,
            ItemRequest,
            CartRequest,
            CartSummary,
            LineItem,
            PlaceOrderRequest,
            UpdateStatusRequest,
            OrderReceipt,
            OrderResponse,
            OrderStatus,
            HealthStatus,
            ErrorDetail,
            FieldError,
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Signup, login, email verification and password reset"),
        (name = "menu", description = "Product catalog"),
        (name = "cart", description = "Cart validation"),
        (name = "order", description = "Checkout and order history")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the bearer JWT and `x-api-key` security schemes.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                    crate::auth::api_key::API_KEY_HEADER,
                ))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/health",
            "/api/auth/signup",
            "/api/auth/reset-password/{token}",
            "/api/menu/category/{category}",
            "/api/cart",
            "/api/order/history",
            "/api/order/{order_id}",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }

    #[test]
    fn security_schemes_are_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
