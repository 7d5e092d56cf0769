//! Record builders for tests

use rust_decimal::Decimal;
use shared::models::{Category, Product};

pub fn category(id: i64, sort_order: i32) -> Category {
    Category {
        id,
        name: format!("Category {id}"),
        description: None,
        image_url: None,
        sort_order,
        is_available: true,
        created_at: 0,
    }
}

pub fn product(id: i64, category_id: Option<i64>, sort_order: i32) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        description: None,
        price: Decimal::new(950, 2),
        image_url: None,
        category_id,
        sort_order,
        is_available: true,
        created_at: 0,
    }
}
