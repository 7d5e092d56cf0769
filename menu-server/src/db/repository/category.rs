//! Category Repository

use super::{RepoError, RepoResult};
use shared::models::{Category, FieldPatch};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const COLUMNS: &str = "id, name, description, image_url, sort_order, is_available, created_at";

/// All categories, ascending by rank (ties by id)
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM categories ORDER BY sort_order, id");
    let categories = sqlx::query_as::<_, Category>(&sql).fetch_all(pool).await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM categories WHERE id = ?");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

/// Insert a fully built category (id and rank assigned by the caller)
pub async fn insert(pool: &SqlitePool, category: &Category) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO categories (id, name, description, image_url, sort_order, is_available, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.image_url)
    .bind(category.sort_order)
    .bind(category.is_available)
    .bind(category.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrite the editable columns of an existing category
pub async fn update(pool: &SqlitePool, category: &Category) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE categories SET name = ?, description = ?, image_url = ?, sort_order = ?, is_available = ? \
         WHERE id = ?",
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.image_url)
    .bind(category.sort_order)
    .bind(category.is_available)
    .bind(category.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {} not found", category.id)));
    }
    Ok(())
}

/// Write rank and/or availability
///
/// Categories have no parent, so a patch carrying `category_id` is rejected.
pub async fn update_fields(pool: &SqlitePool, id: i64, patch: &FieldPatch) -> RepoResult<()> {
    if patch.category_id.is_some() {
        return Err(RepoError::Validation(
            "categories cannot be re-parented".to_string(),
        ));
    }
    if patch.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(sort_order) = patch.sort_order {
            set.push("sort_order = ").push_bind_unseparated(sort_order);
        }
        if let Some(is_available) = patch.is_available {
            set.push("is_available = ").push_bind_unseparated(is_available);
        }
    }
    qb.push(" WHERE id = ").push_bind(id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {} not found", id)));
    }
    Ok(())
}

/// Hard delete. Products of the category keep existing with a NULL category.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
