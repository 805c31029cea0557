use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::SliceError;
use crate::mailer::{EmailTemplate, Mailer, OrderLine};
use crate::models::order::{self, Entity as Order, OrderResponse, OrderStatus};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::models::product::{self, Entity as Product};
use crate::models::user::{Entity as User, Role};
use crate::models::cents_to_amount;

use super::cart::{self, ItemRequest};

/// Summary returned to the client after checkout.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderReceipt {
    pub order_id: i32,
    pub total_amount: f64,
    pub status: OrderStatus,
}

/// A committed order with its rows in submission order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

impl PlacedOrder {
    pub fn receipt(&self) -> OrderReceipt {
        OrderReceipt {
            order_id: self.order.id,
            total_amount: cents_to_amount(self.order.total_cents),
            status: self.order.status,
        }
    }
}

/// Place an order for `user_id`.
///
/// Stock decrement and the order insert share one transaction. The
/// conditional decrements run before any read, so the transaction holds
/// the write lock from its first statement and overlapping checkouts wait
/// their turn instead of failing on an upgrade. Each decrement only
/// applies while enough stock remains, so two orders racing for the last
/// units cannot both succeed and stock never goes negative. Any failure
/// rolls every earlier decrement back.
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: i32,
    items: &[ItemRequest],
    delivery_address: Option<String>,
) -> Result<PlacedOrder, SliceError> {
    if items.is_empty() {
        return Err(SliceError::Validation(
            "Items must be a non-empty array".to_string(),
        ));
    }
    if items.iter().any(|i| i.quantity < 1) {
        return Err(SliceError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let txn = db.begin().await?;
    match place_in_txn(&txn, user_id, items, delivery_address).await {
        Ok(placed) => {
            txn.commit().await?;
            tracing::info!(
                order_id = placed.order.id,
                user_id,
                total_cents = placed.order.total_cents,
                "order placed"
            );
            Ok(placed)
        }
        Err(e) => {
            txn.rollback().await?;
            tracing::debug!(user_id, error = %e, "order rejected, transaction rolled back");
            Err(e)
        }
    }
}

async fn place_in_txn(
    txn: &DatabaseTransaction,
    user_id: i32,
    items: &[ItemRequest],
    delivery_address: Option<String>,
) -> Result<PlacedOrder, SliceError> {
    reserve_stock(txn, &cart::demand(items)).await?;
    let products = cart::load_products(txn, items).await?;
    let cart = cart::price_lines(&products, items)?;

    let now = Utc::now().naive_utc();
    let order = order::ActiveModel {
        user_id: Set(user_id),
        total_cents: Set(cart.total_cents),
        status: Set(OrderStatus::Placed),
        delivery_address: Set(delivery_address.unwrap_or_default().trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let mut rows = Vec::with_capacity(cart.lines.len());
    for (position, line) in cart.lines.iter().enumerate() {
        let row = order_item::ActiveModel {
            order_id: Set(order.id),
            position: Set(position as i32),
            product_id: Set(line.product.id),
            product_name: Set(line.product.name.clone()),
            quantity: Set(line.quantity),
            price_cents: Set(line.price_cents),
            subtotal_cents: Set(line.subtotal_cents),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        rows.push(row);
    }

    Ok(PlacedOrder { order, items: rows })
}

async fn reserve_stock(
    txn: &DatabaseTransaction,
    demand: &[(i32, i32)],
) -> Result<(), SliceError> {
    let now = Utc::now().naive_utc();
    for &(product_id, quantity) in demand {
        let res = Product::update_many()
            .col_expr(
                product::Column::QuantityAvailable,
                Expr::col(product::Column::QuantityAvailable).sub(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(now))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::QuantityAvailable.gte(quantity))
            .exec(txn)
            .await;

        let res = match res {
            Ok(res) => res,
            Err(e) if is_lock_conflict(&e) => {
                tracing::warn!(product_id, error = %e, "stock row held by a concurrent order");
                return Err(stock_error(txn, product_id).await?);
            }
            Err(e) => return Err(e.into()),
        };

        if res.rows_affected == 0 {
            return Err(stock_error(txn, product_id).await?);
        }
    }
    Ok(())
}

/// The client-facing reason a reservation for `product_id` failed.
async fn stock_error(txn: &DatabaseTransaction, product_id: i32) -> Result<SliceError, SliceError> {
    Ok(match Product::find_by_id(product_id).one(txn).await? {
        Some(p) => cart::not_enough_stock(&p),
        None => SliceError::Validation(format!("Product with ID {} not found", product_id)),
    })
}

/// SQLite reports a writer that gave up waiting as "database is locked"
/// (or "database table is locked" for shared-cache connections).
fn is_lock_conflict(err: &DbErr) -> bool {
    err.to_string().contains("is locked")
}

/// Email the order summary. Failures are logged and swallowed: the order
/// is already committed.
pub async fn send_confirmation<C: ConnectionTrait>(
    db: &C,
    mailer: &dyn Mailer,
    placed: &PlacedOrder,
) {
    let user = match User::find_by_id(placed.order.user_id).one(db).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(order_id = placed.order.id, error = %e, "could not load order owner");
            return;
        }
    };

    let template = EmailTemplate::OrderConfirmation {
        username: user.username,
        order_id: placed.order.id,
        status: placed.order.status.to_string(),
        delivery_address: placed.order.delivery_address.clone(),
        lines: placed
            .items
            .iter()
            .map(|i| OrderLine {
                product_name: i.product_name.clone(),
                quantity: i.quantity,
                subtotal_cents: i.subtotal_cents,
            })
            .collect(),
        total_cents: placed.order.total_cents,
    };

    if let Err(e) = mailer.send(&user.email, template).await {
        tracing::warn!(order_id = placed.order.id, error = %e, "order confirmation email failed");
    }
}

async fn load_items<C: ConnectionTrait>(
    db: &C,
    order_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<order_item::Model>>, SliceError> {
    let mut grouped: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }
    let rows = OrderItem::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_item::Column::OrderId)
        .order_by_asc(order_item::Column::Position)
        .all(db)
        .await?;
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}

/// The user's orders, newest first.
pub async fn order_history<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<OrderResponse>, SliceError> {
    let orders = Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;

    let mut items = load_items(db, orders.iter().map(|o| o.id).collect()).await?;
    Ok(orders
        .into_iter()
        .map(|o| {
            let rows = items.remove(&o.id).unwrap_or_default();
            OrderResponse::from_parts(o, rows)
        })
        .collect())
}

async fn find_order<C: ConnectionTrait>(db: &C, order_id: i32) -> Result<order::Model, SliceError> {
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| SliceError::NotFound("Order not found".to_string()))
}

/// One order, visible to its owner only.
pub async fn get_order<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
    requester_id: i32,
) -> Result<OrderResponse, SliceError> {
    let order = find_order(db, order_id).await?;
    if order.user_id != requester_id {
        return Err(SliceError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }
    let mut items = load_items(db, vec![order.id]).await?;
    let rows = items.remove(&order.id).unwrap_or_default();
    Ok(OrderResponse::from_parts(order, rows))
}

/// Parse a status name, rejecting anything outside the lifecycle enum.
pub fn parse_status(raw: &str) -> Result<OrderStatus, SliceError> {
    raw.parse().map_err(|_| {
        let valid = OrderStatus::ALL
            .iter()
            .map(OrderStatus::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        SliceError::Validation(format!("Invalid status. Valid statuses are: {}", valid))
    })
}

/// Admin-only status change.
pub async fn update_status<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
    raw_status: &str,
    requester_role: &Role,
) -> Result<OrderResponse, SliceError> {
    if !requester_role.is_admin() {
        return Err(SliceError::Forbidden(
            "Only admins can update order status".to_string(),
        ));
    }
    let status = parse_status(raw_status)?;
    let order = find_order(db, order_id).await?;

    let mut active: order::ActiveModel = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().naive_utc());
    let order = active.update(db).await?;
    tracing::info!(order_id, status = %status, "order status updated");

    let mut items = load_items(db, vec![order.id]).await?;
    let rows = items.remove(&order.id).unwrap_or_default();
    Ok(OrderResponse::from_parts(order, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_names_valid_values() {
        assert_eq!(parse_status("Delivered").unwrap(), OrderStatus::Delivered);
        match parse_status("Shipped") {
            Err(SliceError::Validation(msg)) => assert_eq!(
                msg,
                "Invalid status. Valid statuses are: Placed, Processing, Delivered, Cancelled"
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn lock_conflicts_are_recognized() {
        assert!(is_lock_conflict(&DbErr::Custom(
            "error returned from database: (code: 5) database is locked".to_string()
        )));
        assert!(!is_lock_conflict(&DbErr::Custom(
            "UNIQUE constraint failed: users.email".to_string()
        )));
    }
}
