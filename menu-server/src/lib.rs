//! Menu Server - 餐厅菜单目录服务
//!
//! # 架构概述
//!
//! 后台通过拖拽调整分类和商品的顺序，访客看到的公开菜单实时跟随：
//!
//! - **排序引擎** (`reorder`): 内存集合、乐观更新、失败回滚
//! - **存储** (`store`, `db`): sqlx SQLite 或进程内存储
//! - **消息总线** (`message`): 同步消息与排序变更通知
//! - **公开菜单** (`menu`): 订阅总线的实时副本
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! menu-server/src/
//! ├── core/          # 配置、状态、错误、HTTP 服务
//! ├── api/           # HTTP 路由和处理器
//! ├── reorder/       # 排序引擎
//! ├── store/         # RecordStore / CatalogStore 实现
//! ├── db/            # SQLite 连接池、迁移、仓储
//! ├── menu/          # 公开菜单视图与实时 feed
//! ├── message/       # 消息总线
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod menu;
pub mod message;
pub mod reorder;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerError, ServerState};
pub use message::{BusMessage, EventType, MessageBus};
pub use reorder::{LoadState, MoveOutcome, ReorderEngine, RollbackPolicies, RollbackPolicy};
pub use store::{CatalogStore, MemoryStore, RecordStore, SqliteStore};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env、创建工作目录、初始化日志、清理过期日志
pub fn setup_environment() -> Result<(), ServerError> {
    // .env 不存在时忽略
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.logs_dir();
    let log_dir = log_dir.to_string_lossy();
    init_logger_with_file(Some(&config.log_level), Some(config.log_json), Some(&log_dir));

    match cleanup_old_logs(&log_dir, config.log_retention_days) {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Old log files removed"),
        Err(e) => tracing::warn!(error = %e, "Log cleanup failed"),
    }

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __  ___
   /  |/  /__  ____  __  __
  / /|_/ / _ \/ __ \/ / / /
 / /  / /  __/ / / / /_/ /
/_/  /_/\___/_/ /_/\__,_/
    "#
    );
}
