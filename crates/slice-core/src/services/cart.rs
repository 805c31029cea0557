use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::SliceError;
use crate::models::order_item::LineItem;
use crate::models::product::{self, Entity as Product};
use crate::models::cents_to_amount;

/// One requested line: a product and how many of it.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ItemRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i32,
}

/// A line priced against the current catalog.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product: product::Model,
    pub quantity: i32,
    pub price_cents: i64,
    pub subtotal_cents: i64,
}

impl PricedLine {
    pub fn to_line_item(&self) -> LineItem {
        LineItem {
            product_id: self.product.id,
            product_name: self.product.name.clone(),
            quantity: self.quantity,
            price: cents_to_amount(self.price_cents),
            subtotal: cents_to_amount(self.subtotal_cents),
        }
    }
}

/// Result of pricing a list of items.
#[derive(Debug, Clone, Default)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub total_cents: i64,
}

/// Client-facing cart summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartSummary {
    pub items: Vec<LineItem>,
    pub total: f64,
}

impl From<&PricedCart> for CartSummary {
    fn from(cart: &PricedCart) -> Self {
        CartSummary {
            items: cart.lines.iter().map(PricedLine::to_line_item).collect(),
            total: cents_to_amount(cart.total_cents),
        }
    }
}

pub(crate) fn not_enough_stock(product: &product::Model) -> SliceError {
    SliceError::Validation(format!(
        "Not enough stock for {}. Available: {}",
        product.name, product.quantity_available
    ))
}

fn product_not_found(product_id: i32) -> SliceError {
    SliceError::Validation(format!("Product with ID {} not found", product_id))
}

/// Total requested quantity per product, in first-seen order.
pub fn demand(items: &[ItemRequest]) -> Vec<(i32, i32)> {
    let mut order: Vec<i32> = Vec::new();
    let mut totals: HashMap<i32, i32> = HashMap::new();
    for item in items {
        let entry = totals.entry(item.product_id).or_insert_with(|| {
            order.push(item.product_id);
            0
        });
        *entry = entry.saturating_add(item.quantity);
    }
    order.into_iter().map(|id| (id, totals[&id])).collect()
}

/// Load every product named by `items`, keyed by id.
pub(crate) async fn load_products<C: ConnectionTrait>(
    db: &C,
    items: &[ItemRequest],
) -> Result<HashMap<i32, product::Model>, SliceError> {
    let ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(Product::find()
        .filter(product::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect())
}

/// Price `items` at the loaded catalog prices. Stock is not looked at.
pub(crate) fn price_lines(
    products: &HashMap<i32, product::Model>,
    items: &[ItemRequest],
) -> Result<PricedCart, SliceError> {
    let mut cart = PricedCart::default();
    for item in items {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| product_not_found(item.product_id))?;

        let subtotal_cents = product.price_cents * i64::from(item.quantity);
        cart.total_cents += subtotal_cents;
        cart.lines.push(PricedLine {
            product: product.clone(),
            quantity: item.quantity,
            price_cents: product.price_cents,
            subtotal_cents,
        });
    }
    Ok(cart)
}

/// Price every item against current stock. All-or-nothing: the first
/// missing product or over-stock line fails the whole list.
///
/// Lines naming the same product are checked against stock together.
/// Read-only.
pub async fn price_items<C: ConnectionTrait>(
    db: &C,
    items: &[ItemRequest],
) -> Result<PricedCart, SliceError> {
    let products = load_products(db, items).await?;

    let mut requested: HashMap<i32, i32> = HashMap::new();
    for item in items {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| product_not_found(item.product_id))?;

        if item.quantity < 1 {
            return Err(SliceError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let wanted = requested.entry(product.id).or_insert(0);
        *wanted = wanted.saturating_add(item.quantity);
        if *wanted > product.quantity_available {
            return Err(not_enough_stock(product));
        }
    }

    price_lines(&products, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::Category;
    use chrono::Utc;

    fn product(id: i32, price_cents: i64) -> product::Model {
        let now = Utc::now().naive_utc();
        product::Model {
            id,
            name: format!("p{id}"),
            description: String::new(),
            category: Category::Pizza,
            price_cents,
            image_url: String::new(),
            quantity_available: 10,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(p: product::Model, quantity: i32) -> PricedLine {
        PricedLine {
            price_cents: p.price_cents,
            subtotal_cents: p.price_cents * i64::from(quantity),
            product: p,
            quantity,
        }
    }

    fn item(product_id: i32, quantity: i32) -> ItemRequest {
        ItemRequest {
            product_id,
            quantity,
        }
    }

    #[test]
    fn demand_sums_repeated_products_in_first_seen_order() {
        let items = [item(2, 1), item(1, 2), item(2, 3)];
        assert_eq!(demand(&items), vec![(2, 4), (1, 2)]);
    }

    #[test]
    fn price_lines_ignores_stock() {
        let mut sold_out = product(1, 499);
        sold_out.quantity_available = 0;
        let products = HashMap::from([(1, sold_out)]);

        let cart = price_lines(&products, &[item(1, 3)]).unwrap();
        assert_eq!(cart.total_cents, 1497);
        assert_eq!(cart.lines[0].subtotal_cents, 1497);
    }

    #[test]
    fn price_lines_rejects_unknown_product() {
        let err = price_lines(&HashMap::new(), &[item(9, 1)]).unwrap_err();
        assert_eq!(err.to_string(), "Product with ID 9 not found");
    }

    #[test]
    fn summary_converts_cents() {
        let cart = PricedCart {
            lines: vec![line(product(1, 1299), 2)],
            total_cents: 2598,
        };
        let summary = CartSummary::from(&cart);
        assert_eq!(summary.total, 25.98);
        assert_eq!(summary.items[0].subtotal, 25.98);
        assert_eq!(summary.items[0].price, 12.99);
    }
}
