//! Engine observer that publishes to the bus

use std::sync::Arc;

use async_trait::async_trait;
use shared::message::{BusMessage, NotificationPayload, OrderChangedPayload};

use super::MessageBus;
use crate::reorder::OrderObserver;

/// Forwards settled order changes as `order_changed` notifications
#[derive(Debug, Clone)]
pub struct BusObserver {
    bus: Arc<MessageBus>,
}

impl BusObserver {
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl OrderObserver for BusObserver {
    async fn order_changed(&self, change: OrderChangedPayload) {
        let payload = NotificationPayload::order_changed(change.kind, change.version);
        match BusMessage::notification(&payload) {
            Ok(msg) => {
                if let Err(e) = self.bus.publish(msg.with_source("reorder-engine")).await {
                    tracing::warn!(error = %e, "Failed to publish order change");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode order change"),
        }
    }
}
