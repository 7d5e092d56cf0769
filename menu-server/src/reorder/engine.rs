//! ReorderEngine - 内存中的有序集合 + 乐观更新 + 失败回滚

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use shared::error::{AppError, AppResult};
use shared::message::OrderChangedPayload;
use shared::models::{Category, FieldPatch, ItemKind, MoveIntent, Product};
use tokio::sync::Mutex as AsyncMutex;

use super::gesture::{CommitEnd, DragPhase, GestureMachine};
use super::moves::{Placement, plan_category_move, plan_product_move, resolve_product_target};
use super::partition::{ProductGroup, category_ids, group_products, sort_by_rank};
use super::{LoadState, MoveOutcome, OrderObserver, RollbackPolicies, RollbackPolicy};
use crate::core::ResourceVersions;
use crate::store::CatalogStore;

#[derive(Debug, Clone, Default)]
pub(super) struct Collections {
    /// Ascending by (sort_order, id)
    pub(super) categories: Vec<Category>,
    /// Ascending by (sort_order, id) across all partitions
    pub(super) products: Vec<Product>,
}

impl Collections {
    pub(super) fn parent_of(&self, product_id: i64) -> Option<i64> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .and_then(|p| p.category_id)
    }
}

/// Reorder engine
///
/// Owns the authoritative in-memory copy of both collections. Every
/// mutation of a collection runs under that collection's commit gate, so a
/// toggle issued while a drag batch is in flight waits for the batch to
/// settle. Category deletes take the category gate, then the product gate.
pub struct ReorderEngine {
    pub(super) store: Arc<dyn CatalogStore>,
    observer: Arc<dyn OrderObserver>,
    versions: Arc<ResourceVersions>,
    pub(super) policies: RollbackPolicies,
    pub(super) state: RwLock<Collections>,
    load_state: RwLock<LoadState>,
    gesture: Mutex<GestureMachine>,
    pub(super) category_gate: AsyncMutex<()>,
    pub(super) product_gate: AsyncMutex<()>,
}

impl std::fmt::Debug for ReorderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ReorderEngine")
            .field("categories_count", &state.categories.len())
            .field("products_count", &state.products.len())
            .field("load_state", &*self.load_state.read())
            .field("policies", &self.policies)
            .finish()
    }
}

/// Resets the gesture if a commit is dropped before it finishes
struct CommitTicket<'a> {
    gesture: &'a Mutex<GestureMachine>,
    done: bool,
}

impl CommitTicket<'_> {
    fn finish(mut self, outcome: &MoveOutcome) {
        let end = match outcome {
            MoveOutcome::NoOp => CommitEnd::NoOp,
            MoveOutcome::Settled { version } => CommitEnd::Settled(*version),
            MoveOutcome::RolledBack { .. } => CommitEnd::RolledBack,
        };
        self.gesture.lock().finish(end);
        self.done = true;
    }
}

impl Drop for CommitTicket<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.gesture.lock().abort();
        }
    }
}

impl ReorderEngine {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        observer: Arc<dyn OrderObserver>,
        versions: Arc<ResourceVersions>,
        policies: RollbackPolicies,
    ) -> Self {
        Self {
            store,
            observer,
            versions,
            policies,
            state: RwLock::new(Collections::default()),
            load_state: RwLock::new(LoadState::Loading),
            gesture: Mutex::new(GestureMachine::default()),
            category_gate: AsyncMutex::new(()),
            product_gate: AsyncMutex::new(()),
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch both collections from the store, replacing local state
    ///
    /// Used for the initial load and for forced reloads. A failure leaves
    /// the engine in [`LoadState::Failed`] until the next successful load.
    pub async fn load(&self) -> AppResult<()> {
        let _categories = self.category_gate.lock().await;
        let _products = self.product_gate.lock().await;

        let fetched = futures::try_join!(self.store.fetch_categories(), self.store.fetch_products());
        match fetched {
            Ok((mut categories, mut products)) => {
                sort_by_rank(&mut categories);
                sort_by_rank(&mut products);
                let (category_count, product_count) = (categories.len(), products.len());
                {
                    let mut state = self.state.write();
                    state.categories = categories;
                    state.products = products;
                }
                *self.load_state.write() = LoadState::Ready;
                tracing::info!(
                    categories = category_count,
                    products = product_count,
                    "Catalog loaded"
                );
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(error = %reason, "Catalog load failed");
                *self.load_state.write() = LoadState::Failed(reason.clone());
                Err(AppError::store_unavailable(reason))
            }
        }
    }

    /// Refetch one collection. Caller holds that collection's gate.
    ///
    /// Returns whether the refetch succeeded.
    pub(super) async fn resync(&self, kind: ItemKind) -> bool {
        let result = match kind {
            ItemKind::Category => self.store.fetch_categories().await.map(|mut categories| {
                sort_by_rank(&mut categories);
                self.state.write().categories = categories;
            }),
            ItemKind::Product => self.store.fetch_products().await.map(|mut products| {
                sort_by_rank(&mut products);
                self.state.write().products = products;
            }),
        };

        match result {
            Ok(()) => {
                tracing::info!(resource = %kind, "Collection resynchronised from store");
                true
            }
            Err(e) => {
                tracing::error!(resource = %kind, error = %e, "Resync failed");
                *self.load_state.write() = LoadState::Failed(e.to_string());
                false
            }
        }
    }

    /// Error unless the catalog finished loading
    pub fn ensure_ready(&self) -> AppResult<()> {
        match &*self.load_state.read() {
            LoadState::Ready => Ok(()),
            LoadState::Loading => Err(AppError::not_loaded("Catalog is still loading")),
            LoadState::Failed(reason) => Err(AppError::not_loaded(format!(
                "Catalog unavailable: {reason}"
            ))),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn load_state(&self) -> LoadState {
        self.load_state.read().clone()
    }

    /// Categories by rank
    pub fn categories(&self) -> Vec<Category> {
        self.state.read().categories.clone()
    }

    /// All products by (rank, id)
    pub fn products(&self) -> Vec<Product> {
        self.state.read().products.clone()
    }

    pub fn category(&self, id: i64) -> Option<Category> {
        self.state.read().categories.iter().find(|c| c.id == id).cloned()
    }

    pub fn product(&self, id: i64) -> Option<Product> {
        self.state.read().products.iter().find(|p| p.id == id).cloned()
    }

    /// Product lists per category plus the uncategorized list
    pub fn grouped_products(&self) -> Vec<ProductGroup> {
        let state = self.state.read();
        group_products(&state.categories, &state.products)
    }

    /// Settled-change counter of a collection
    pub fn version(&self, kind: ItemKind) -> u64 {
        self.versions.get(kind.resource())
    }

    // =========================================================================
    // Gesture
    // =========================================================================

    pub fn gesture_phase(&self) -> DragPhase {
        self.gesture.lock().phase()
    }

    /// A record was picked up. Nothing is written while dragging.
    pub fn begin_drag(&self, kind: ItemKind, active_id: i64) -> AppResult<()> {
        self.ensure_ready()?;
        let exists = match kind {
            ItemKind::Category => self.category(active_id).is_some(),
            ItemKind::Product => self.product(active_id).is_some(),
        };
        if !exists {
            return Err(not_found(kind, active_id));
        }
        self.gesture.lock().begin(kind, active_id)?;
        tracing::debug!(resource = %kind, active_id, "Drag started");
        Ok(())
    }

    pub fn cancel_drag(&self) {
        self.gesture.lock().cancel();
    }

    fn start_commit(&self, kind: ItemKind, active_id: i64) -> AppResult<CommitTicket<'_>> {
        self.gesture.lock().commit(kind, active_id)?;
        Ok(CommitTicket {
            gesture: &self.gesture,
            done: false,
        })
    }

    // =========================================================================
    // Drops
    // =========================================================================

    /// Move a category onto another category's position
    ///
    /// Self-drops, drops outside any target and unknown ids are no-ops.
    /// On success every category's new rank has been written. On failure
    /// local state is restored (and refetched under the default policy);
    /// the failure is reported in the outcome, not as an error.
    ///
    /// The batch runs on its own task: dropping the returned future does
    /// not stop it from settling or rolling back.
    pub async fn reorder_categories(self: &Arc<Self>, intent: MoveIntent) -> AppResult<MoveOutcome> {
        self.detached(move |engine| async move { engine.run_category_drop(intent).await })
            .await
    }

    async fn run_category_drop(&self, intent: MoveIntent) -> AppResult<MoveOutcome> {
        self.ensure_ready()?;
        let ticket = self.start_commit(ItemKind::Category, intent.active_id)?;
        let _gate = self.category_gate.lock().await;
        self.ensure_ready()?;

        let (snapshot, placements) = {
            let state = self.state.read();
            let order: Vec<i64> = state.categories.iter().map(|c| c.id).collect();
            (state.categories.clone(), plan_category_move(&order, &intent))
        };

        let Some(placements) = placements else {
            tracing::debug!(active_id = intent.active_id, over = ?intent.over_id, "Category drop is a no-op");
            let outcome = MoveOutcome::NoOp;
            ticket.finish(&outcome);
            return Ok(outcome);
        };

        // Optimistic: local order changes before anything is written
        apply_category_placements(&mut self.state.write().categories, &placements);

        let updates = placements
            .iter()
            .map(|p| (p.id, FieldPatch::rank(p.sort_order)))
            .collect();
        let failed = self.persist_batch(ItemKind::Category, updates).await;

        let outcome = if failed == 0 {
            self.settle(ItemKind::Category).await
        } else {
            self.state.write().categories = snapshot;
            let resynced = self
                .after_rollback(ItemKind::Category, self.policies.categories)
                .await;
            MoveOutcome::RolledBack { failed, resynced }
        };

        ticket.finish(&outcome);
        Ok(outcome)
    }

    /// Move or re-parent a product
    ///
    /// Dropped on a product: takes that product's position (and its category
    /// when it lives elsewhere). Dropped on a category drop zone or the
    /// uncategorized zone: appended to that list. Every product of the
    /// touched lists gets its rank and category written.
    pub async fn reorder_or_reparent_products(
        self: &Arc<Self>,
        intent: MoveIntent,
    ) -> AppResult<MoveOutcome> {
        self.detached(move |engine| async move { engine.run_product_drop(intent).await })
            .await
    }

    async fn run_product_drop(&self, intent: MoveIntent) -> AppResult<MoveOutcome> {
        self.ensure_ready()?;
        let ticket = self.start_commit(ItemKind::Product, intent.active_id)?;
        let _gate = self.product_gate.lock().await;
        self.ensure_ready()?;

        let (snapshot, plan) = {
            let state = self.state.read();
            let ids = category_ids(&state.categories);
            let target = resolve_product_target(&intent, &ids, &state.products);
            let plan = plan_product_move(&state.products, &ids, intent.active_id, target);
            (state.products.clone(), plan)
        };

        let Some(plan) = plan else {
            tracing::debug!(active_id = intent.active_id, over = ?intent.over_id, "Product drop is a no-op");
            let outcome = MoveOutcome::NoOp;
            ticket.finish(&outcome);
            return Ok(outcome);
        };

        tracing::debug!(
            active_id = plan.active_id,
            source = %plan.source,
            destination = %plan.destination,
            "Product move planned"
        );

        apply_product_placements(&mut self.state.write().products, &plan.placements);

        let updates = plan
            .placements
            .iter()
            .map(|p| (p.id, FieldPatch::placement(p.sort_order, p.category_id)))
            .collect();
        let failed = self.persist_batch(ItemKind::Product, updates).await;

        let outcome = if failed == 0 {
            self.settle(ItemKind::Product).await
        } else {
            self.state.write().products = snapshot;
            let resynced = self
                .after_rollback(ItemKind::Product, self.policies.products)
                .await;
            MoveOutcome::RolledBack { failed, resynced }
        };

        ticket.finish(&outcome);
        Ok(outcome)
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Show or hide a record on the public menu
    ///
    /// Applied locally first. A failed write restores the previous value,
    /// refetches under the default policy, and is returned as an error.
    pub async fn set_availability(
        self: &Arc<Self>,
        kind: ItemKind,
        id: i64,
        is_available: bool,
    ) -> AppResult<()> {
        self.detached(move |engine| async move {
            engine.run_set_availability(kind, id, is_available).await
        })
        .await
    }

    async fn run_set_availability(&self, kind: ItemKind, id: i64, is_available: bool) -> AppResult<()> {
        self.ensure_ready()?;
        let _gate = self.gate(kind).lock().await;
        self.ensure_ready()?;

        let previous = self
            .swap_availability(kind, id, is_available)
            .ok_or_else(|| not_found(kind, id))?;

        match self
            .store
            .update_fields(kind, id, &FieldPatch::availability(is_available))
            .await
        {
            Ok(()) => {
                tracing::info!(resource = %kind, id, is_available, "Availability changed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(resource = %kind, id, error = %e, "Availability update failed, rolling back");
                self.swap_availability(kind, id, previous);
                self.after_rollback(kind, self.policies.availability).await;
                Err(e.into())
            }
        }
    }

    /// Set `is_available` locally, returning the previous value
    fn swap_availability(&self, kind: ItemKind, id: i64, value: bool) -> Option<bool> {
        let mut state = self.state.write();
        let slot = match kind {
            ItemKind::Category => &mut state.categories.iter_mut().find(|c| c.id == id)?.is_available,
            ItemKind::Product => &mut state.products.iter_mut().find(|p| p.id == id)?.is_available,
        };
        Some(std::mem::replace(slot, value))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run a mutation on its own task and wait for it
    ///
    /// Local state is changed before the store answers, so a mutation must
    /// reach its settle or rollback step even when the caller goes away
    /// (client disconnect, request timeout).
    pub(super) async fn detached<T, F, Fut>(self: &Arc<Self>, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        tokio::spawn(op(Arc::clone(self)))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Catalog mutation task failed");
                AppError::internal(format!("Catalog mutation task failed: {e}"))
            })?
    }

    pub(super) fn gate(&self, kind: ItemKind) -> &AsyncMutex<()> {
        match kind {
            ItemKind::Category => &self.category_gate,
            ItemKind::Product => &self.product_gate,
        }
    }

    /// Issue every update concurrently and wait for all of them
    ///
    /// Returns the number of failed updates. No short-circuit, no retry.
    pub(super) async fn persist_batch(&self, kind: ItemKind, updates: Vec<(i64, FieldPatch)>) -> usize {
        let total = updates.len();
        let results = join_all(updates.iter().map(|(id, patch)| async move {
            (*id, self.store.update_fields(kind, *id, patch).await)
        }))
        .await;

        let mut failed = 0;
        for (id, result) in results {
            if let Err(e) = result {
                failed += 1;
                tracing::warn!(resource = %kind, id, error = %e, "Rank update failed");
            }
        }

        if failed > 0 {
            tracing::warn!(resource = %kind, total, failed, "Rank batch partially failed");
        } else {
            tracing::debug!(resource = %kind, total, "Rank batch persisted");
        }
        failed
    }

    /// Write `placements` that differ from local state, locally and to the store
    ///
    /// Returns (written, failed).
    pub(super) async fn commit_placements(&self, kind: ItemKind, placements: Vec<Placement>) -> (usize, usize) {
        let changed: Vec<Placement> = {
            let state = self.state.read();
            match kind {
                ItemKind::Category => {
                    let current: HashMap<i64, i32> =
                        state.categories.iter().map(|c| (c.id, c.sort_order)).collect();
                    placements
                        .into_iter()
                        .filter(|p| current.get(&p.id) != Some(&p.sort_order))
                        .collect()
                }
                ItemKind::Product => {
                    let current: HashMap<i64, (i32, Option<i64>)> = state
                        .products
                        .iter()
                        .map(|p| (p.id, (p.sort_order, p.category_id)))
                        .collect();
                    placements
                        .into_iter()
                        .filter(|p| current.get(&p.id) != Some(&(p.sort_order, p.category_id)))
                        .collect()
                }
            }
        };

        if changed.is_empty() {
            return (0, 0);
        }

        let updates = {
            let mut state = self.state.write();
            match kind {
                ItemKind::Category => {
                    apply_category_placements(&mut state.categories, &changed);
                    changed.iter().map(|p| (p.id, FieldPatch::rank(p.sort_order))).collect()
                }
                ItemKind::Product => {
                    apply_product_placements(&mut state.products, &changed);
                    changed
                        .iter()
                        .map(|p| (p.id, FieldPatch::placement(p.sort_order, p.category_id)))
                        .collect()
                }
            }
        };

        let failed = self.persist_batch(kind, updates).await;
        (changed.len(), failed)
    }

    /// Bump the version and notify the observer
    pub(super) async fn settle(&self, kind: ItemKind) -> MoveOutcome {
        let version = self.versions.increment(kind.resource());
        self.observer
            .order_changed(OrderChangedPayload { kind, version })
            .await;
        tracing::info!(resource = %kind, version, "Order settled");
        MoveOutcome::Settled { version }
    }

    /// Snapshot already restored; refetch when the policy asks for it
    ///
    /// Returns whether a refetch happened and succeeded.
    pub(super) async fn after_rollback(&self, kind: ItemKind, policy: RollbackPolicy) -> bool {
        tracing::warn!(resource = %kind, ?policy, "Rolled back optimistic state");
        match policy {
            RollbackPolicy::RestoreSnapshot => false,
            RollbackPolicy::Resync => self.resync(kind).await,
        }
    }
}

pub(super) fn not_found(kind: ItemKind, id: i64) -> AppError {
    match kind {
        ItemKind::Category => AppError::category_not_found(id),
        ItemKind::Product => AppError::product_not_found(id),
    }
}

pub(super) fn apply_category_placements(categories: &mut [Category], placements: &[Placement]) {
    for placement in placements {
        if let Some(category) = categories.iter_mut().find(|c| c.id == placement.id) {
            category.sort_order = placement.sort_order;
        }
    }
    sort_by_rank(categories);
}

pub(super) fn apply_product_placements(products: &mut [Product], placements: &[Placement]) {
    for placement in placements {
        if let Some(product) = products.iter_mut().find(|p| p.id == placement.id) {
            product.sort_order = placement.sort_order;
            product.category_id = placement.category_id;
        }
    }
    sort_by_rank(products);
}
