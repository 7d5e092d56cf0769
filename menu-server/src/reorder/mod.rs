//! Reorder engine
//!
//! Keeps the ordered category and product collections in memory, applies
//! drag-and-drop moves optimistically, persists the resulting ranks and
//! reconciles when persistence fails.
//!
//! # 模块结构
//!
//! ```text
//! reorder/
//! ├── partition.rs   # 按有效父分类分组商品
//! ├── moves.rs       # 纯函数: 拖拽 -> 新排序
//! ├── gesture.rs     # 拖拽手势状态机
//! ├── observer.rs    # 排序变更回调
//! ├── engine.rs      # ReorderEngine (加载、拖拽、上下架)
//! └── crud.rs        # 增删改 (删除后压缩排序)
//! ```

mod crud;
mod engine;
pub mod gesture;
pub mod moves;
mod observer;
pub mod partition;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::ReorderEngine;
pub use gesture::DragPhase;
pub use observer::OrderObserver;
pub use partition::ProductGroup;

use serde::Serialize;
use std::str::FromStr;

/// Catalog load state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Result of a drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Nothing changed and nothing was written
    NoOp,
    /// Every rank update succeeded
    Settled { version: u64 },
    /// At least one update failed; local state was restored
    RolledBack { failed: usize, resynced: bool },
}

/// What to do with local state after a failed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Put back the pre-operation snapshot only
    RestoreSnapshot,
    /// Put back the snapshot, then refetch the collection from the store
    Resync,
}

impl FromStr for RollbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" | "restore" => Ok(RollbackPolicy::RestoreSnapshot),
            "resync" | "refetch" => Ok(RollbackPolicy::Resync),
            other => Err(format!("unknown rollback policy '{other}'")),
        }
    }
}

/// Rollback policy per operation family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollbackPolicies {
    pub categories: RollbackPolicy,
    pub products: RollbackPolicy,
    pub availability: RollbackPolicy,
}

impl Default for RollbackPolicies {
    fn default() -> Self {
        Self {
            categories: RollbackPolicy::Resync,
            products: RollbackPolicy::RestoreSnapshot,
            availability: RollbackPolicy::Resync,
        }
    }
}
