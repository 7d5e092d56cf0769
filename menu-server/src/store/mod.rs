//! Record store abstraction
//!
//! [`RecordStore`] is everything the reorder engine and the menu feed need:
//! ordered bulk reads, per-record field updates and deletes.
//! [`CatalogStore`] adds the create/update/profile operations used by the
//! CRUD endpoints.
//!
//! Implementations:
//! - [`SqliteStore`] - sqlx over the migrated SQLite database
//! - [`MemoryStore`] - in-process tables with failure injection

mod memory;
mod sqlite;

pub use memory::{MemoryStore, UpdateCall};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use shared::models::{Category, FieldPatch, ItemKind, Product, Profile, ProfileUpdate};

use crate::db::repository::RepoResult;

/// Ordered record store consumed by the reorder engine
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All categories ascending by `sort_order`, ties by id
    async fn fetch_categories(&self) -> RepoResult<Vec<Category>>;

    /// All products ascending by `sort_order`, ties by id
    async fn fetch_products(&self) -> RepoResult<Vec<Product>>;

    /// Write the fields present in `patch`
    async fn update_fields(&self, kind: ItemKind, id: i64, patch: &FieldPatch) -> RepoResult<()>;

    /// Hard delete. Deleting a category clears `category_id` on its products.
    async fn delete_record(&self, kind: ItemKind, id: i64) -> RepoResult<()>;
}

/// Full catalog store (records plus profile)
#[async_trait]
pub trait CatalogStore: RecordStore {
    async fn insert_category(&self, category: &Category) -> RepoResult<()>;

    async fn save_category(&self, category: &Category) -> RepoResult<()>;

    async fn insert_product(&self, product: &Product) -> RepoResult<()>;

    async fn save_product(&self, product: &Product) -> RepoResult<()>;

    async fn get_profile(&self) -> RepoResult<Profile>;

    async fn update_profile(&self, data: &ProfileUpdate) -> RepoResult<Profile>;
}
