use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::error::SliceError;
use crate::models::product::{self, Category, Entity as Product, DEFAULT_IMAGE_URL};

/// Fields for a new menu entry.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub quantity_available: i32,
}

/// Parse a category path segment, rejecting anything outside the menu enum.
pub fn parse_category(raw: &str) -> Result<Category, SliceError> {
    raw.parse().map_err(|_| {
        let valid = Category::ALL
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        SliceError::Validation(format!(
            "Invalid category. Valid categories are: {}",
            valid
        ))
    })
}

/// All products in storage order.
pub async fn list_products<C: ConnectionTrait>(db: &C) -> Result<Vec<product::Model>, SliceError> {
    Ok(Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?)
}

/// Products of one category in storage order.
pub async fn list_by_category<C: ConnectionTrait>(
    db: &C,
    category: Category,
) -> Result<Vec<product::Model>, SliceError> {
    Ok(Product::find()
        .filter(product::Column::Category.eq(category))
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_product<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<product::Model, SliceError> {
    Product::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| SliceError::NotFound("Product not found".to_string()))
}

/// Insert a product. Used by seeding and admin tooling.
pub async fn create_product<C: ConnectionTrait>(
    db: &C,
    new: NewProduct,
) -> Result<product::Model, SliceError> {
    if new.name.trim().is_empty() {
        return Err(SliceError::Validation("Product name is required".to_string()));
    }
    if new.price_cents < 0 {
        return Err(SliceError::Validation("Price cannot be negative".to_string()));
    }
    if new.quantity_available < 0 {
        return Err(SliceError::Validation("Quantity cannot be negative".to_string()));
    }

    let now = Utc::now().naive_utc();
    let model = product::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(new.description),
        category: Set(new.category),
        price_cents: Set(new.price_cents),
        image_url: Set(new
            .image_url
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string())),
        quantity_available: Set(new.quantity_available),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_category_lists_valid_values_on_error() {
        assert_eq!(parse_category("Drink").unwrap(), Category::Drink);
        match parse_category("Dessert") {
            Err(SliceError::Validation(msg)) => {
                assert_eq!(
                    msg,
                    "Invalid category. Valid categories are: Pizza, Drink, Bread"
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
