//! 进程内消息总线
//!
//! ```text
//! handlers ──broadcast_sync──┐
//!                            ▼
//! ReorderEngine ──BusObserver──► MessageBus (broadcast::Sender<BusMessage>)
//!                                      │
//!                                      ▼
//!                                  MenuFeed
//! ```

mod bus;
mod observer;

pub use bus::{BusConfig, MessageBus};
pub use observer::BusObserver;
pub use shared::message::{
    BusMessage, EventType, NotificationPayload, OrderChangedPayload, SyncAction, SyncPayload,
};
