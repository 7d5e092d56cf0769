//! Live menu feed
//!
//! Keeps the public menu's copy of the catalog current by applying bus
//! messages. Record-level `Sync` messages are applied in place; an
//! `order_changed` notification (or a lagged receiver) triggers a refetch.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use shared::error::{AppError, AppResult};
use shared::message::{BusMessage, EventType, NotificationPayload, SyncAction, SyncPayload};
use shared::models::{Category, ItemKind, Product, Ranked};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::MenuView;
use crate::message::MessageBus;
use crate::reorder::partition::sort_by_rank;
use crate::store::RecordStore;

/// What applying one message did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpdate {
    Applied,
    /// Ranks changed elsewhere; the copy must be refetched
    NeedsRefresh,
    Ignored,
}

#[derive(Debug, Default)]
struct FeedState {
    categories: Vec<Category>,
    products: Vec<Product>,
}

pub struct MenuFeed {
    store: Arc<dyn RecordStore>,
    state: RwLock<FeedState>,
}

impl std::fmt::Debug for MenuFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MenuFeed")
            .field("categories", &state.categories.len())
            .field("products", &state.products.len())
            .finish()
    }
}

impl MenuFeed {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            state: RwLock::new(FeedState::default()),
        }
    }

    /// Refetch both collections
    pub async fn refresh(&self) -> AppResult<()> {
        let (mut categories, mut products) =
            futures::try_join!(self.store.fetch_categories(), self.store.fetch_products())
                .map_err(|e| AppError::store_unavailable(e.to_string()))?;
        sort_by_rank(&mut categories);
        sort_by_rank(&mut products);

        let mut state = self.state.write();
        state.categories = categories;
        state.products = products;
        tracing::debug!(
            categories = state.categories.len(),
            products = state.products.len(),
            "Menu feed refreshed"
        );
        Ok(())
    }

    /// Current public menu
    pub fn view(&self) -> MenuView {
        let state = self.state.read();
        MenuView::build(&state.categories, &state.products)
    }

    /// Apply one bus message to the local copy
    pub fn apply(&self, msg: &BusMessage) -> FeedUpdate {
        match msg.event_type {
            EventType::Sync => match msg.parse_payload::<SyncPayload>() {
                Ok(payload) => self.apply_sync(&payload),
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed sync payload");
                    FeedUpdate::Ignored
                }
            },
            EventType::Notification => match msg.parse_payload::<NotificationPayload>() {
                Ok(payload) if payload.order_change().is_some() => FeedUpdate::NeedsRefresh,
                Ok(_) => FeedUpdate::Ignored,
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed notification payload");
                    FeedUpdate::Ignored
                }
            },
        }
    }

    fn apply_sync(&self, payload: &SyncPayload) -> FeedUpdate {
        let Some(kind) = ItemKind::from_resource(&payload.resource) else {
            return FeedUpdate::Ignored;
        };
        let Ok(id) = payload.id.parse::<i64>() else {
            tracing::warn!(resource = %payload.resource, id = %payload.id, "Sync id is not numeric");
            return FeedUpdate::Ignored;
        };

        let mut state = self.state.write();
        let applied = match (kind, payload.action) {
            (ItemKind::Category, SyncAction::Deleted) => {
                remove(&mut state.categories, id);
                true
            }
            (ItemKind::Product, SyncAction::Deleted) => {
                remove(&mut state.products, id);
                true
            }
            (ItemKind::Category, _) => decode(payload)
                .map(|category: Category| upsert(&mut state.categories, category))
                .is_some(),
            (ItemKind::Product, _) => decode(payload)
                .map(|product: Product| upsert(&mut state.products, product))
                .is_some(),
        };

        if applied {
            tracing::trace!(resource = %kind, id, action = %payload.action, version = payload.version, "Sync applied");
            FeedUpdate::Applied
        } else {
            FeedUpdate::Ignored
        }
    }

    /// Start the background task consuming `bus`
    ///
    /// The task stops when the bus shuts down or its channel closes.
    pub fn spawn(self: &Arc<Self>, bus: &MessageBus) -> JoinHandle<()> {
        let receiver = bus.subscribe();
        let token = bus.shutdown_token().clone();
        let feed = Arc::clone(self);
        tokio::spawn(async move { feed.run(receiver, token).await })
    }

    async fn run(&self, mut receiver: broadcast::Receiver<BusMessage>, token: CancellationToken) {
        tracing::info!("Menu feed started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Menu feed shutting down");
                    break;
                }

                msg_result = receiver.recv() => {
                    match msg_result {
                        Ok(msg) => {
                            if self.apply(&msg) == FeedUpdate::NeedsRefresh {
                                self.refresh_logged().await;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Menu feed lagged, refetching");
                            self.refresh_logged().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Menu feed stopped");
    }

    async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            tracing::error!(error = %e, "Menu feed refresh failed");
        }
    }
}

fn decode<T: DeserializeOwned>(payload: &SyncPayload) -> Option<T> {
    let data = payload.data.clone()?;
    match serde_json::from_value(data) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(resource = %payload.resource, error = %e, "Sync data does not decode");
            None
        }
    }
}

fn upsert<T: Ranked>(items: &mut Vec<T>, record: T) {
    match items.iter_mut().find(|item| item.id() == record.id()) {
        Some(slot) => *slot = record,
        None => items.push(record),
    }
    sort_by_rank(items);
}

fn remove<T: Ranked>(items: &mut Vec<T>, id: i64) {
    items.retain(|item| item.id() != id);
}
