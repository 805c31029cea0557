use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::cents_to_amount;

pub const DEFAULT_IMAGE_URL: &str = "https://via.placeholder.com/300";

/// Menu category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Category {
    #[sea_orm(string_value = "Pizza")]
    Pizza,
    #[sea_orm(string_value = "Drink")]
    Drink,
    #[sea_orm(string_value = "Bread")]
    Bread,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Pizza, Category::Drink, Category::Bread];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pizza => "Pizza",
            Category::Drink => "Drink",
            Category::Bread => "Bread",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

/// Product entity: one menu entry with its stock counter.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub category: Category,

    pub price_cents: i64,

    pub image_url: String,

    /// Never negative; only the conditional decrement lowers it.
    pub quantity_available: i32,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ─── Response DTO ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: f64,
    pub image_url: String,
    pub quantity_available: i32,
}

impl From<Model> for ProductResponse {
    fn from(m: Model) -> Self {
        ProductResponse {
            id: m.id,
            name: m.name,
            description: m.description,
            category: m.category,
            price: cents_to_amount(m.price_cents),
            image_url: m.image_url,
            quantity_available: m.quantity_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_exact_names_only() {
        assert_eq!("Pizza".parse::<Category>(), Ok(Category::Pizza));
        assert_eq!("Bread".parse::<Category>(), Ok(Category::Bread));
        assert!("pizza".parse::<Category>().is_err());
        assert!("Dessert".parse::<Category>().is_err());
    }
}
