use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ItemKind;

// ==================== Notification Level ====================

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// 普通信息
    Info,
    /// 警告
    Warning,
    /// 错误
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// 通知分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// 系统级通知
    System,
    /// 排序变更
    Ordering,
}

// ==================== Payloads ====================

/// 通知载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// 标题
    pub title: String,
    /// 消息内容
    pub message: String,
    /// 通知级别
    pub level: NotificationLevel,
    /// 通知分类
    pub category: NotificationCategory,
    /// 附加数据 (JSON)
    pub data: Option<serde_json::Value>,
}

/// 同步变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// 同步信号载荷
///
/// 某条记录发生变更时广播，订阅者据此 upsert 或移除本地副本。
///
/// # 示例
/// - `resource`: "product"
/// - `version`: 42
/// - `action`: "updated"
/// - `id`: "7301234567890"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// 资源类型 ("category" | "product" | "profile")
    pub resource: String,
    /// 版本号 (每个资源单调递增)
    pub version: u64,
    /// 变更类型
    pub action: SyncAction,
    /// 资源 ID
    pub id: String,
    /// 资源数据 (deleted 时为 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// 排序变更 (附在 order_changed 通知的 data 中)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChangedPayload {
    pub kind: ItemKind,
    pub version: u64,
}

pub const ORDER_CHANGED_TITLE: &str = "order_changed";

// ==================== Convenience Constructors ====================

impl NotificationPayload {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Info,
            category: NotificationCategory::System,
            data: None,
        }
    }

    /// 排序已提交 (kind 的集合整体重排)
    pub fn order_changed(kind: ItemKind, version: u64) -> Self {
        Self {
            title: ORDER_CHANGED_TITLE.to_string(),
            message: format!("{} order changed", kind),
            level: NotificationLevel::Info,
            category: NotificationCategory::Ordering,
            data: serde_json::to_value(OrderChangedPayload { kind, version }).ok(),
        }
    }

    /// 若为排序变更通知，取出其内容
    pub fn order_change(&self) -> Option<OrderChangedPayload> {
        if self.category != NotificationCategory::Ordering {
            return None;
        }
        self.data
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
