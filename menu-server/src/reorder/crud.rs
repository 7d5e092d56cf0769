//! Create / update / delete through the engine
//!
//! Writes go to the store first; local state only changes once the store
//! accepted the write. Deletes and re-parents then compact the ranks of
//! the list the record left. Each call runs on its own task (see
//! `ReorderEngine::detached`), so a compaction is never cut off halfway.

use std::sync::Arc;

use shared::error::{AppError, AppResult};
use shared::models::{
    Category, CategoryCreate, CategoryUpdate, ContainerId, ItemKind, Product, ProductCreate,
    ProductUpdate,
};
use shared::util::{now_millis, snowflake_id};

use super::engine::{ReorderEngine, not_found};
use super::moves::rank_placements;
use super::partition::{
    category_ids, container_of, next_product_rank, next_rank, partition_ids, sort_by_rank,
};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_price,
    validate_required_text,
};

impl ReorderEngine {
    // =========================================================================
    // Categories
    // =========================================================================

    /// Create a category at the end of the category list
    pub async fn create_category(self: &Arc<Self>, data: CategoryCreate) -> AppResult<Category> {
        self.detached(move |engine| async move { engine.run_create_category(data).await })
            .await
    }

    async fn run_create_category(&self, data: CategoryCreate) -> AppResult<Category> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
        validate_optional_text(&data.image_url, "image_url", MAX_URL_LEN)?;

        self.ensure_ready()?;
        let _gate = self.category_gate.lock().await;

        let category = Category {
            id: snowflake_id(),
            name: data.name.trim().to_string(),
            description: data.description,
            image_url: data.image_url,
            sort_order: next_rank(&self.state.read().categories),
            is_available: data.is_available.unwrap_or(true),
            created_at: now_millis(),
        };

        self.store.insert_category(&category).await?;
        {
            let mut state = self.state.write();
            state.categories.push(category.clone());
            sort_by_rank(&mut state.categories);
        }

        tracing::info!(id = category.id, name = %category.name, rank = category.sort_order, "Category created");
        Ok(category)
    }

    /// Update descriptive fields of a category. The rank is never touched.
    pub async fn update_category(
        self: &Arc<Self>,
        id: i64,
        data: CategoryUpdate,
    ) -> AppResult<Category> {
        self.detached(move |engine| async move { engine.run_update_category(id, data).await })
            .await
    }

    async fn run_update_category(&self, id: i64, data: CategoryUpdate) -> AppResult<Category> {
        if let Some(name) = &data.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
        validate_optional_text(&data.image_url, "image_url", MAX_URL_LEN)?;

        self.ensure_ready()?;
        let _gate = self.category_gate.lock().await;

        let mut category = self
            .category(id)
            .ok_or_else(|| AppError::category_not_found(id))?;
        if let Some(name) = data.name {
            category.name = name.trim().to_string();
        }
        if data.description.is_some() {
            category.description = data.description;
        }
        if data.image_url.is_some() {
            category.image_url = data.image_url;
        }
        if let Some(is_available) = data.is_available {
            category.is_available = is_available;
        }

        self.store.save_category(&category).await?;
        if let Some(slot) = self.state.write().categories.iter_mut().find(|c| c.id == id) {
            *slot = category.clone();
        }

        tracing::info!(id, "Category updated");
        Ok(category)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product at the end of its category's list
    pub async fn create_product(self: &Arc<Self>, data: ProductCreate) -> AppResult<Product> {
        self.detached(move |engine| async move { engine.run_create_product(data).await })
            .await
    }

    async fn run_create_product(&self, data: ProductCreate) -> AppResult<Product> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
        validate_optional_text(&data.image_url, "image_url", MAX_URL_LEN)?;
        validate_price(data.price)?;

        self.ensure_ready()?;
        let _gate = self.product_gate.lock().await;

        let sort_order = {
            let state = self.state.read();
            let ids = category_ids(&state.categories);
            let container = match data.category_id {
                Some(category_id) if !ids.contains(&category_id) => {
                    return Err(AppError::category_not_found(category_id));
                }
                Some(category_id) => ContainerId::Category(category_id),
                None => ContainerId::Uncategorized,
            };
            next_product_rank(&state.products, &ids, container)
        };

        let product = Product {
            id: snowflake_id(),
            name: data.name.trim().to_string(),
            description: data.description,
            price: data.price,
            image_url: data.image_url,
            category_id: data.category_id,
            sort_order,
            is_available: data.is_available.unwrap_or(true),
            created_at: now_millis(),
        };

        self.store.insert_product(&product).await?;
        {
            let mut state = self.state.write();
            state.products.push(product.clone());
            sort_by_rank(&mut state.products);
        }

        tracing::info!(
            id = product.id,
            name = %product.name,
            category_id = ?product.category_id,
            rank = product.sort_order,
            "Product created"
        );
        Ok(product)
    }

    /// Update a product
    ///
    /// Changing the category appends the product to the new list and
    /// compacts the list it left.
    pub async fn update_product(
        self: &Arc<Self>,
        id: i64,
        data: ProductUpdate,
    ) -> AppResult<Product> {
        self.detached(move |engine| async move { engine.run_update_product(id, data).await })
            .await
    }

    async fn run_update_product(&self, id: i64, data: ProductUpdate) -> AppResult<Product> {
        if let Some(name) = &data.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
        validate_optional_text(&data.image_url, "image_url", MAX_URL_LEN)?;
        if let Some(price) = data.price {
            validate_price(price)?;
        }

        self.ensure_ready()?;
        let _gate = self.product_gate.lock().await;

        let (mut product, source, destination, destination_rank) = {
            let state = self.state.read();
            let ids = category_ids(&state.categories);
            let product = state
                .products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| AppError::product_not_found(id))?;
            let source = container_of(&product, &ids);
            let destination = match data.category_id {
                None => source,
                Some(None) => ContainerId::Uncategorized,
                Some(Some(category_id)) if ids.contains(&category_id) => {
                    ContainerId::Category(category_id)
                }
                Some(Some(category_id)) => return Err(AppError::category_not_found(category_id)),
            };
            let destination_rank = next_product_rank(&state.products, &ids, destination);
            (product, source, destination, destination_rank)
        };

        if let Some(name) = data.name {
            product.name = name.trim().to_string();
        }
        if data.description.is_some() {
            product.description = data.description;
        }
        if let Some(price) = data.price {
            product.price = price;
        }
        if data.image_url.is_some() {
            product.image_url = data.image_url;
        }
        if let Some(is_available) = data.is_available {
            product.is_available = is_available;
        }
        if let Some(category_id) = data.category_id {
            product.category_id = category_id;
        }

        let reparented = source != destination;
        if reparented {
            product.sort_order = destination_rank;
        }

        self.store.save_product(&product).await?;
        {
            let mut state = self.state.write();
            if let Some(slot) = state.products.iter_mut().find(|p| p.id == id) {
                *slot = product.clone();
            }
            sort_by_rank(&mut state.products);
        }

        if reparented {
            tracing::info!(id, %source, %destination, "Product moved to another list");
            self.compact_products(source).await;
        } else {
            tracing::info!(id, "Product updated");
        }
        Ok(product)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Hard-delete a record and compact the ranks of its siblings
    ///
    /// Deleting a category moves its products to the end of the
    /// uncategorized list.
    pub async fn delete(self: &Arc<Self>, kind: ItemKind, id: i64) -> AppResult<()> {
        self.ensure_ready()?;
        self.detached(move |engine| async move {
            match kind {
                ItemKind::Product => engine.delete_product(id).await,
                ItemKind::Category => engine.delete_category(id).await,
            }
        })
        .await
    }

    async fn delete_product(&self, id: i64) -> AppResult<()> {
        let _gate = self.product_gate.lock().await;

        let source = {
            let state = self.state.read();
            let product = state
                .products
                .iter()
                .find(|p| p.id == id)
                .ok_or_else(|| not_found(ItemKind::Product, id))?;
            container_of(product, &category_ids(&state.categories))
        };

        self.store.delete_record(ItemKind::Product, id).await?;
        self.state.write().products.retain(|p| p.id != id);
        tracing::info!(id, %source, "Product deleted");

        self.compact_products(source).await;
        Ok(())
    }

    async fn delete_category(&self, id: i64) -> AppResult<()> {
        let _categories = self.category_gate.lock().await;
        let _products = self.product_gate.lock().await;

        if self.category(id).is_none() {
            return Err(not_found(ItemKind::Category, id));
        }

        self.store.delete_record(ItemKind::Category, id).await?;

        // Store already cleared category_id on the orphans
        let (category_order, uncategorized_order) = {
            let mut state = self.state.write();
            let ids_before = category_ids(&state.categories);
            let mut uncategorized =
                partition_ids(&state.products, &ids_before, ContainerId::Uncategorized);
            let orphans = partition_ids(&state.products, &ids_before, ContainerId::Category(id));

            state.categories.retain(|c| c.id != id);
            for product in state.products.iter_mut() {
                if product.category_id == Some(id) {
                    product.category_id = None;
                }
            }

            uncategorized.extend(orphans);
            let category_order: Vec<i64> = state.categories.iter().map(|c| c.id).collect();
            (category_order, uncategorized)
        };
        tracing::info!(id, orphans_and_uncategorized = uncategorized_order.len(), "Category deleted");

        let (_, failed) = self
            .commit_placements(ItemKind::Category, rank_placements(&category_order, |_| None))
            .await;
        if failed > 0 {
            self.resync(ItemKind::Category).await;
        }

        let placements = rank_placements(&uncategorized_order, |pid| self.state.read().parent_of(pid));
        let (_, failed) = self.commit_placements(ItemKind::Product, placements).await;
        if failed > 0 {
            self.resync(ItemKind::Product).await;
        }
        Ok(())
    }

    /// Re-rank one product list as `0..n-1`, writing only changed ranks
    ///
    /// Caller holds the product gate. A failed write refetches products.
    async fn compact_products(&self, container: ContainerId) {
        let placements = {
            let state = self.state.read();
            let ids = category_ids(&state.categories);
            let order = partition_ids(&state.products, &ids, container);
            rank_placements(&order, |pid| state.parent_of(pid))
        };

        let (written, failed) = self.commit_placements(ItemKind::Product, placements).await;
        if failed > 0 {
            tracing::warn!(%container, written, failed, "Rank compaction failed, refetching products");
            self.resync(ItemKind::Product).await;
        } else if written > 0 {
            tracing::debug!(%container, written, "Ranks compacted");
        }
    }
}
