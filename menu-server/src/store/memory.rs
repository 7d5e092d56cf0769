//! In-memory store
//!
//! Serves the `memory` backend and the engine tests. Writes can be made to
//! fail or stall on demand so rollback and cancellation paths can be
//! exercised.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared::models::{Category, FieldPatch, ItemKind, Product, Profile, ProfileUpdate};

use super::{CatalogStore, RecordStore};
use crate::db::repository::{RepoError, RepoResult};

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    profile: Profile,
}

/// One recorded `update_fields` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCall {
    pub kind: ItemKind,
    pub id: i64,
    pub patch: FieldPatch,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    /// `update_fields` fails for these ids
    failing_ids: RwLock<HashSet<i64>>,
    /// Every write other than `update_fields` fails
    fail_writes: AtomicBool,
    /// Fetches fail
    fail_fetches: AtomicBool,
    /// Each `update_fields` call sleeps this long before answering
    update_delay: Mutex<Duration>,
    update_log: Mutex<Vec<UpdateCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.tables.write().profile.id = 1;
        store
    }

    /// Store pre-filled with records (ranks are taken as given)
    pub fn with_records(categories: Vec<Category>, products: Vec<Product>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            tables.categories = categories.into_iter().map(|c| (c.id, c)).collect();
            tables.products = products.into_iter().map(|p| (p.id, p)).collect();
        }
        store
    }

    // ========== Failure injection ==========

    /// Make `update_fields` fail for the given ids
    pub fn fail_updates_for(&self, ids: impl IntoIterator<Item = i64>) {
        self.failing_ids.write().extend(ids);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Slow down every `update_fields` call (a store under load)
    pub fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.lock() = delay;
    }

    /// Clear every injected failure and delay
    pub fn heal(&self) {
        self.failing_ids.write().clear();
        self.set_fail_writes(false);
        self.set_fail_fetches(false);
        self.set_update_delay(Duration::ZERO);
    }

    // ========== Inspection ==========

    /// `update_fields` calls received so far, in arrival order
    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.update_log.lock().clone()
    }

    fn check_writes(&self) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Database("injected write failure".to_string()));
        }
        Ok(())
    }

    fn check_fetches(&self) -> RepoResult<()> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(RepoError::Database("injected fetch failure".to_string()));
        }
        Ok(())
    }
}

fn by_rank<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (i32, i64),
{
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_categories(&self) -> RepoResult<Vec<Category>> {
        self.check_fetches()?;
        let categories = self.tables.read().categories.values().cloned().collect();
        Ok(by_rank(categories, |c: &Category| (c.sort_order, c.id)))
    }

    async fn fetch_products(&self) -> RepoResult<Vec<Product>> {
        self.check_fetches()?;
        let products = self.tables.read().products.values().cloned().collect();
        Ok(by_rank(products, |p: &Product| (p.sort_order, p.id)))
    }

    async fn update_fields(&self, kind: ItemKind, id: i64, patch: &FieldPatch) -> RepoResult<()> {
        self.update_log.lock().push(UpdateCall {
            kind,
            id,
            patch: *patch,
        });

        let delay = *self.update_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing_ids.read().contains(&id) {
            return Err(RepoError::Database(format!(
                "injected update failure for {} {}",
                kind, id
            )));
        }

        let mut tables = self.tables.write();
        match kind {
            ItemKind::Category => {
                if patch.category_id.is_some() {
                    return Err(RepoError::Validation(
                        "categories cannot be re-parented".to_string(),
                    ));
                }
                let category = tables
                    .categories
                    .get_mut(&id)
                    .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)))?;
                if let Some(sort_order) = patch.sort_order {
                    category.sort_order = sort_order;
                }
                if let Some(is_available) = patch.is_available {
                    category.is_available = is_available;
                }
            }
            ItemKind::Product => {
                let current = tables.products.get(&id).and_then(|p| p.category_id);
                if let Some(Some(category_id)) = patch.category_id
                    && current != Some(category_id)
                    && !tables.categories.contains_key(&category_id)
                {
                    return Err(RepoError::Validation(format!(
                        "Category {} does not exist",
                        category_id
                    )));
                }
                let product = tables
                    .products
                    .get_mut(&id)
                    .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;
                if let Some(sort_order) = patch.sort_order {
                    product.sort_order = sort_order;
                }
                if let Some(category_id) = patch.category_id {
                    product.category_id = category_id;
                }
                if let Some(is_available) = patch.is_available {
                    product.is_available = is_available;
                }
            }
        }
        Ok(())
    }

    async fn delete_record(&self, kind: ItemKind, id: i64) -> RepoResult<()> {
        self.check_writes()?;
        let mut tables = self.tables.write();
        match kind {
            ItemKind::Category => {
                if tables.categories.remove(&id).is_none() {
                    return Err(RepoError::NotFound(format!("Category {} not found", id)));
                }
                // ON DELETE SET NULL
                for product in tables.products.values_mut() {
                    if product.category_id == Some(id) {
                        product.category_id = None;
                    }
                }
            }
            ItemKind::Product => {
                if tables.products.remove(&id).is_none() {
                    return Err(RepoError::NotFound(format!("Product {} not found", id)));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_category(&self, category: &Category) -> RepoResult<()> {
        self.check_writes()?;
        let mut tables = self.tables.write();
        if tables.categories.contains_key(&category.id) {
            return Err(RepoError::Duplicate(format!("Category {}", category.id)));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn save_category(&self, category: &Category) -> RepoResult<()> {
        self.check_writes()?;
        let mut tables = self.tables.write();
        let slot = tables
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", category.id)))?;
        *slot = category.clone();
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> RepoResult<()> {
        self.check_writes()?;
        let mut tables = self.tables.write();
        if tables.products.contains_key(&product.id) {
            return Err(RepoError::Duplicate(format!("Product {}", product.id)));
        }
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> RepoResult<()> {
        self.check_writes()?;
        let mut tables = self.tables.write();
        let slot = tables
            .products
            .get_mut(&product.id)
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", product.id)))?;
        *slot = product.clone();
        Ok(())
    }

    async fn get_profile(&self) -> RepoResult<Profile> {
        self.check_fetches()?;
        Ok(self.tables.read().profile.clone())
    }

    async fn update_profile(&self, data: &ProfileUpdate) -> RepoResult<Profile> {
        self.check_writes()?;
        let mut tables = self.tables.write();
        let profile = &mut tables.profile;
        if let Some(name) = &data.business_name {
            profile.business_name = name.clone();
        }
        if let Some(url) = &data.instagram_url {
            profile.instagram_url = Some(url.clone());
        }
        if let Some(url) = &data.cover_image_url {
            profile.cover_image_url = Some(url.clone());
        }
        profile.updated_at = Some(shared::util::now_millis());
        Ok(profile.clone())
    }
}
