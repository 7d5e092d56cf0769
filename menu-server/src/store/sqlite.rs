//! SQLite-backed store

use async_trait::async_trait;
use shared::models::{Category, FieldPatch, ItemKind, Product, Profile, ProfileUpdate};

use super::{CatalogStore, RecordStore};
use crate::db::DbService;
use crate::db::repository::{RepoError, RepoResult, category, product, profile};

#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: DbService,
}

impl SqliteStore {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_categories(&self) -> RepoResult<Vec<Category>> {
        category::find_all(&self.db.pool).await
    }

    async fn fetch_products(&self) -> RepoResult<Vec<Product>> {
        product::find_all(&self.db.pool).await
    }

    async fn update_fields(&self, kind: ItemKind, id: i64, patch: &FieldPatch) -> RepoResult<()> {
        match kind {
            ItemKind::Category => category::update_fields(&self.db.pool, id, patch).await,
            ItemKind::Product => product::update_fields(&self.db.pool, id, patch).await,
        }
    }

    async fn delete_record(&self, kind: ItemKind, id: i64) -> RepoResult<()> {
        let deleted = match kind {
            ItemKind::Category => category::delete(&self.db.pool, id).await?,
            ItemKind::Product => product::delete(&self.db.pool, id).await?,
        };
        if !deleted {
            return Err(RepoError::NotFound(format!("{} {} not found", kind, id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn insert_category(&self, data: &Category) -> RepoResult<()> {
        category::insert(&self.db.pool, data).await
    }

    async fn save_category(&self, data: &Category) -> RepoResult<()> {
        category::update(&self.db.pool, data).await
    }

    async fn insert_product(&self, data: &Product) -> RepoResult<()> {
        product::insert(&self.db.pool, data).await
    }

    async fn save_product(&self, data: &Product) -> RepoResult<()> {
        product::update(&self.db.pool, data).await
    }

    async fn get_profile(&self) -> RepoResult<Profile> {
        profile::get(&self.db.pool).await
    }

    async fn update_profile(&self, data: &ProfileUpdate) -> RepoResult<Profile> {
        profile::update(&self.db.pool, data).await
    }
}
