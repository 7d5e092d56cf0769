use std::sync::Arc;

use dashmap::DashMap;
use shared::message::{BusMessage, SyncAction, SyncPayload};

use crate::core::{Config, ServerError, StoreBackend};
use crate::db::DbService;
use crate::menu::MenuFeed;
use crate::message::{BusConfig, BusObserver, MessageBus};
use crate::reorder::ReorderEngine;
use crate::store::{CatalogStore, MemoryStore, SqliteStore};

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增。
///
/// # 使用场景
///
/// broadcast_sync 和排序提交共用同一计数器，
/// 订阅者可以通过版本号判断数据新旧。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    /// 创建空的版本管理器
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    ///
    /// 如果资源不存在，返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | Arc<dyn CatalogStore> | 记录存储 (SQLite / 内存) |
/// | engine | Arc<ReorderEngine> | 排序引擎 (后台集合的唯一写入者) |
/// | feed | Arc<MenuFeed> | 公开菜单的实时副本 |
/// | message_bus | Arc<MessageBus> | 进程内消息总线 |
/// | resource_versions | Arc<ResourceVersions> | 资源版本管理 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    pub store: Arc<dyn CatalogStore>,
    pub engine: Arc<ReorderEngine>,
    pub feed: Arc<MenuFeed>,
    pub message_bus: Arc<MessageBus>,
    /// 资源版本管理器 (用于 broadcast_sync 自动递增版本号)
    pub resource_versions: Arc<ResourceVersions>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("feed", &self.feed)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 存储 (SQLite: 打开数据库并迁移; memory: 空表)
    /// 3. 消息总线、排序引擎、菜单 feed
    /// 4. 首次加载目录 (失败不阻止启动，引擎进入 Failed 状态)
    pub async fn initialize(config: &Config) -> Result<Self, ServerError> {
        config.ensure_work_dir_structure()?;

        let state = match config.store_backend {
            StoreBackend::Sqlite => {
                let db_path = config.database_file();
                let db = DbService::new(&db_path.to_string_lossy())
                    .await
                    .map_err(ServerError::Database)?;
                Self::with_store(config.clone(), Arc::new(SqliteStore::new(db)))
            }
            StoreBackend::Memory if config.is_production() => {
                return Err(ServerError::Config(
                    "STORE_BACKEND=memory is not allowed in production".into(),
                ));
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on exit");
                Self::with_store(config.clone(), Arc::new(MemoryStore::new()))
            }
        };

        state.load_catalog().await;
        Ok(state)
    }

    /// 用给定存储构造状态 (测试也走这里)
    pub fn with_store<S: CatalogStore + 'static>(config: Config, store: Arc<S>) -> Self {
        let message_bus = Arc::new(MessageBus::from_config(BusConfig {
            channel_capacity: config.bus_capacity,
        }));
        let resource_versions = Arc::new(ResourceVersions::new());
        let engine = Arc::new(ReorderEngine::new(
            store.clone(),
            Arc::new(BusObserver::new(message_bus.clone())),
            resource_versions.clone(),
            config.rollback,
        ));
        let feed = Arc::new(MenuFeed::new(store.clone()));

        Self {
            config,
            store,
            engine,
            feed,
            message_bus,
            resource_versions,
        }
    }

    /// 加载引擎集合与菜单副本
    ///
    /// 失败只记录日志: 引擎保持 Failed，可通过 /api/catalog/reload 重试
    pub async fn load_catalog(&self) {
        if let Err(e) = self.engine.load().await {
            tracing::error!(error = %e, "Initial catalog load failed");
        }
        if let Err(e) = self.feed.refresh().await {
            tracing::error!(error = %e, "Initial menu feed load failed");
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 菜单 feed (订阅消息总线)
    pub fn start_background_tasks(&self) {
        self.feed.spawn(&self.message_bus);
    }

    /// 获取消息总线
    pub fn message_bus(&self) -> &Arc<MessageBus> {
        &self.message_bus
    }

    /// 广播同步消息
    ///
    /// 版本号由 ResourceVersions 自动递增管理。
    ///
    /// # 参数
    /// - `resource`: 资源类型 ("category", "product", "profile")
    /// - `action`: 变更类型
    /// - `id`: 资源 ID
    /// - `data`: 资源数据 (deleted 时为 None)
    pub async fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: SyncAction,
        id: i64,
        data: Option<&T>,
    ) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action,
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        match BusMessage::sync(&payload) {
            Ok(msg) => {
                if let Err(e) = self.message_bus.publish(msg).await {
                    tracing::warn!(resource, id, error = %e, "Failed to broadcast sync");
                }
            }
            Err(e) => tracing::error!(resource, id, error = %e, "Failed to encode sync payload"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_versions() {
        let versions = ResourceVersions::new();
        assert_eq!(versions.get("product"), 0);
        assert_eq!(versions.increment("product"), 1);
        assert_eq!(versions.increment("product"), 2);
        assert_eq!(versions.get("category"), 0);
    }

    #[tokio::test]
    async fn test_memory_backend_refused_in_production() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.store_backend = StoreBackend::Memory;
        config.environment = "production".into();

        let result = ServerState::initialize(&config).await;
        assert!(matches!(result, Err(ServerError::Config(_))));

        config.environment = "development".into();
        let state = ServerState::initialize(&config).await.unwrap();
        assert!(state.engine.ensure_ready().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_sync_bumps_version() {
        let state = ServerState::with_store(
            Config::with_overrides("/tmp/menu-state-test", 0),
            Arc::new(MemoryStore::new()),
        );
        let mut rx = state.message_bus().subscribe();

        state
            .broadcast_sync::<()>("category", SyncAction::Deleted, 5, None)
            .await;

        let payload: SyncPayload = rx.recv().await.unwrap().parse_payload().unwrap();
        assert_eq!(payload.version, 1);
        assert_eq!(payload.id, "5");
        assert_eq!(state.resource_versions.get("category"), 1);
    }
}
