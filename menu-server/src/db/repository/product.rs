//! Product Repository
//!
//! Prices are stored as decimal strings and parsed back into `Decimal`.

use super::{RepoError, RepoResult};
use rust_decimal::Decimal;
use shared::models::{FieldPatch, Product};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

const COLUMNS: &str =
    "id, name, description, price, image_url, category_id, sort_order, is_available, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: String,
    image_url: Option<String>,
    category_id: Option<i64>,
    sort_order: i32,
    is_available: bool,
    created_at: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepoError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            RepoError::Database(format!("Product {} has invalid price '{}': {e}", row.id, row.price))
        })?;
        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            category_id: row.category_id,
            sort_order: row.sort_order,
            is_available: row.is_available,
            created_at: row.created_at,
        })
    }
}

/// All products, ascending by rank (ties by id)
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM products ORDER BY sort_order, id");
    let rows = sqlx::query_as::<_, ProductRow>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(Product::try_from).collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM products WHERE id = ?");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Product::try_from).transpose()
}

/// Insert a fully built product (id and rank assigned by the caller)
pub async fn insert(pool: &SqlitePool, product: &Product) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO products (id, name, description, price, image_url, category_id, sort_order, is_available, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price.to_string())
    .bind(&product.image_url)
    .bind(product.category_id)
    .bind(product.sort_order)
    .bind(product.is_available)
    .bind(product.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrite the editable columns of an existing product
pub async fn update(pool: &SqlitePool, product: &Product) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE products SET name = ?, description = ?, price = ?, image_url = ?, category_id = ?, \
         sort_order = ?, is_available = ? WHERE id = ?",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price.to_string())
    .bind(&product.image_url)
    .bind(product.category_id)
    .bind(product.sort_order)
    .bind(product.is_available)
    .bind(product.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {} not found", product.id)));
    }
    Ok(())
}

/// Write any of rank, category and availability in one statement
pub async fn update_fields(pool: &SqlitePool, id: i64, patch: &FieldPatch) -> RepoResult<()> {
    if patch.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(sort_order) = patch.sort_order {
            set.push("sort_order = ").push_bind_unseparated(sort_order);
        }
        if let Some(category_id) = patch.category_id {
            set.push("category_id = ").push_bind_unseparated(category_id);
        }
        if let Some(is_available) = patch.is_available {
            set.push("is_available = ").push_bind_unseparated(is_available);
        }
    }
    qb.push(" WHERE id = ").push_bind(id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {} not found", id)));
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
