//! 消息总线消息类型定义
//!
//! 这些类型在 menu-server 的进程内消息总线上传递，也是
//! 实时订阅者（公开菜单视图）看到的数据格式。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// 消息总线事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 系统通知 (例如排序变更)
    Notification = 1,
    /// 同步信号 (单条记录的新增/修改/删除)
    Sync = 4,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Notification => write!(f, "notification"),
            EventType::Sync => write!(f, "sync"),
        }
    }
}

/// 消息总线消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub source: Option<String>,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            source: None,
            payload,
        }
    }

    /// 设置来源
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// 创建通知消息
    pub fn notification(payload: &NotificationPayload) -> Result<Self, serde_json::Error> {
        Ok(Self::new(EventType::Notification, serde_json::to_vec(payload)?))
    }

    /// 创建同步信号消息
    pub fn sync(payload: &SyncPayload) -> Result<Self, serde_json::Error> {
        Ok(Self::new(EventType::Sync, serde_json::to_vec(payload)?))
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;

    #[test]
    fn test_sync_message() {
        let payload = SyncPayload {
            resource: "product".to_string(),
            version: 3,
            action: SyncAction::Updated,
            id: "42".to_string(),
            data: Some(serde_json::json!({"name": "Tea"})),
        };
        let msg = BusMessage::sync(&payload).unwrap();
        assert_eq!(msg.event_type, EventType::Sync);
        assert!(!msg.request_id.is_nil());

        let parsed: SyncPayload = msg.parse_payload().unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_order_changed_notification() {
        let msg = BusMessage::notification(&NotificationPayload::order_changed(
            ItemKind::Product,
            7,
        ))
        .unwrap();
        assert_eq!(msg.event_type, EventType::Notification);

        let parsed: NotificationPayload = msg.parse_payload().unwrap();
        let change = parsed.order_change().unwrap();
        assert_eq!(change.kind, ItemKind::Product);
        assert_eq!(change.version, 7);
    }

    #[test]
    fn test_plain_notification_is_not_an_order_change() {
        let parsed: NotificationPayload = BusMessage::notification(&NotificationPayload::info("t", "m"))
            .unwrap()
            .parse_payload()
            .unwrap();
        assert!(parsed.order_change().is_none());
        assert_eq!(EventType::Notification.to_string(), "notification");
    }
}
