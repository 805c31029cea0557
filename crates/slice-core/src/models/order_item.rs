use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::cents_to_amount;

/// One line of an order. Name and price are snapshots taken at checkout.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub order_id: i32,

    /// Position within the submitted item list.
    pub position: i32,

    pub product_id: i32,

    pub product_name: String,

    pub quantity: i32,

    pub price_cents: i64,

    pub subtotal_cents: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Priced line item, shared by cart validation and order responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub price: f64,
    pub subtotal: f64,
}

impl From<Model> for LineItem {
    fn from(m: Model) -> Self {
        LineItem {
            product_id: m.product_id,
            product_name: m.product_name,
            quantity: m.quantity,
            price: cents_to_amount(m.price_cents),
            subtotal: cents_to_amount(m.subtotal_cents),
        }
    }
}
