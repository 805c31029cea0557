//! Starter menu for a fresh database.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::error::SliceError;
use crate::models::product::{self, Category, Entity as Product};
use crate::services::catalog::{self, NewProduct};

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    category: Category,
    price_cents: i64,
    image_text: &'static str,
    quantity_available: i32,
}

const MENU: &[SeedProduct] = &[
    SeedProduct {
        name: "Margherita Pizza",
        description: "Classic pizza with tomato, mozzarella, and basil",
        category: Category::Pizza,
        price_cents: 1299,
        image_text: "Margherita+Pizza",
        quantity_available: 50,
    },
    SeedProduct {
        name: "Pepperoni Pizza",
        description: "Traditional pizza topped with pepperoni and cheese",
        category: Category::Pizza,
        price_cents: 1499,
        image_text: "Pepperoni+Pizza",
        quantity_available: 45,
    },
    SeedProduct {
        name: "Vegetarian Pizza",
        description: "Fresh vegetables with mozzarella on crispy crust",
        category: Category::Pizza,
        price_cents: 1399,
        image_text: "Vegetarian+Pizza",
        quantity_available: 40,
    },
    SeedProduct {
        name: "BBQ Chicken Pizza",
        description: "Grilled chicken with BBQ sauce and onions",
        category: Category::Pizza,
        price_cents: 1599,
        image_text: "BBQ+Chicken+Pizza",
        quantity_available: 35,
    },
    SeedProduct {
        name: "Coca Cola",
        description: "Cold refreshing cola drink",
        category: Category::Drink,
        price_cents: 299,
        image_text: "Coca+Cola",
        quantity_available: 100,
    },
    SeedProduct {
        name: "Orange Juice",
        description: "Fresh squeezed orange juice",
        category: Category::Drink,
        price_cents: 399,
        image_text: "Orange+Juice",
        quantity_available: 80,
    },
    SeedProduct {
        name: "Iced Tea",
        description: "Refreshing iced tea with lemon",
        category: Category::Drink,
        price_cents: 249,
        image_text: "Iced+Tea",
        quantity_available: 90,
    },
    SeedProduct {
        name: "Lemonade",
        description: "Homemade fresh lemonade",
        category: Category::Drink,
        price_cents: 349,
        image_text: "Lemonade",
        quantity_available: 70,
    },
    SeedProduct {
        name: "Garlic Bread",
        description: "Warm garlic bread with Italian seasoning",
        category: Category::Bread,
        price_cents: 499,
        image_text: "Garlic+Bread",
        quantity_available: 60,
    },
    SeedProduct {
        name: "Focaccia Bread",
        description: "Italian focaccia with olive oil and herbs",
        category: Category::Bread,
        price_cents: 599,
        image_text: "Focaccia+Bread",
        quantity_available: 40,
    },
    SeedProduct {
        name: "Sourdough Bread",
        description: "Artisan sourdough bread with tangy flavor",
        category: Category::Bread,
        price_cents: 449,
        image_text: "Sourdough+Bread",
        quantity_available: 50,
    },
    SeedProduct {
        name: "Multigrain Bread",
        description: "Healthy multigrain bread with seeds",
        category: Category::Bread,
        price_cents: 549,
        image_text: "Multigrain+Bread",
        quantity_available: 55,
    },
];

/// Outcome of a seeding run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Insert every menu product whose name is not in the catalog yet.
///
/// Existing products are left alone: they may already be referenced by
/// order lines.
pub async fn seed_catalog(db: &DatabaseConnection) -> Result<SeedReport, SliceError> {
    let mut report = SeedReport::default();

    for item in MENU {
        let exists = Product::find()
            .filter(product::Column::Name.eq(item.name))
            .one(db)
            .await?
            .is_some();
        if exists {
            report.skipped += 1;
            continue;
        }

        let created = catalog::create_product(
            db,
            NewProduct {
                name: item.name.to_string(),
                description: item.description.to_string(),
                category: item.category,
                price_cents: item.price_cents,
                image_url: Some(format!(
                    "https://via.placeholder.com/300?text={}",
                    item.image_text
                )),
                quantity_available: item.quantity_available,
            },
        )
        .await?;
        tracing::info!(
            "seeded {} ({}): ${:.2}",
            created.name,
            created.category,
            crate::models::cents_to_amount(created.price_cents)
        );
        report.inserted += 1;
    }

    Ok(report)
}

/// Number of products in the starter menu.
pub fn menu_size() -> usize {
    MENU.len()
}
