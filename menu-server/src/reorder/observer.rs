use async_trait::async_trait;
use shared::message::OrderChangedPayload;

/// Notified after a collection's new order has been persisted
#[async_trait]
pub trait OrderObserver: Send + Sync {
    async fn order_changed(&self, change: OrderChangedPayload);
}
