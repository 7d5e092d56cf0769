use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use shared::error::AppError;
use shared::message::BusMessage;

/// Bus configuration
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Messages buffered per subscriber before it lags
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Broadcast bus for catalog change messages
#[derive(Debug)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
    config: BusConfig,
    shutdown_token: CancellationToken,
}

impl MessageBus {
    /// Create a new message bus with default configuration
    pub fn new() -> Self {
        Self::from_config(BusConfig::default())
    }

    pub fn from_config(config: BusConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            tx,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_config(BusConfig {
            channel_capacity: capacity,
        })
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Publish to every subscriber
    ///
    /// Having no subscribers is not an error; the message is dropped.
    pub async fn publish(&self, msg: BusMessage) -> Result<(), AppError> {
        match self.tx.send(msg) {
            Ok(receivers) => {
                tracing::trace!(receivers, "Bus message published");
                Ok(())
            }
            Err(_) if !self.shutdown_token.is_cancelled() => {
                tracing::trace!("Bus message dropped, no subscribers");
                Ok(())
            }
            Err(_) => Err(AppError::internal("Message bus is shut down")),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    /// Get the shutdown token (for monitoring shutdown signals)
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Gracefully shutdown the message bus
    ///
    /// Cancels every task watching the shutdown token.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{NotificationPayload, SyncAction, SyncPayload};

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = MessageBus::with_capacity(8);
        let mut rx = bus.subscribe();

        let payload = SyncPayload {
            resource: "category".into(),
            version: 1,
            action: SyncAction::Created,
            id: "7".into(),
            data: None,
        };
        bus.publish(BusMessage::sync(&payload).unwrap()).await.unwrap();

        let received = rx.recv().await.unwrap();
        let parsed: SyncPayload = received.parse_payload().unwrap();
        assert_eq!(parsed.id, "7");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = MessageBus::new();
        let msg = BusMessage::notification(&NotificationPayload::info("t", "m")).unwrap();
        assert!(bus.publish(msg).await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_without_subscribers_fails() {
        let bus = MessageBus::new();
        bus.shutdown();
        assert!(bus.shutdown_token().is_cancelled());
        let msg = BusMessage::notification(&NotificationPayload::info("t", "m")).unwrap();
        assert!(bus.publish(msg).await.is_err());
    }
}
