use std::path::PathBuf;
use std::str::FromStr;

use crate::reorder::{RollbackPolicies, RollbackPolicy};

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// sqlx SQLite (持久化)
    Sqlite,
    /// 进程内存储 (演示 / 测试)
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/menu | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_PATH | {WORK_DIR}/database/menu.db | SQLite 数据库文件 |
/// | STORE_BACKEND | sqlite | sqlite 或 memory |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | {WORK_DIR}/logs | 滚动日志目录 |
/// | LOG_RETENTION_DAYS | 14 | 日志保留天数 |
/// | BUS_CAPACITY | 1024 | 消息总线缓冲 |
/// | CATEGORY_ROLLBACK | resync | 分类拖拽失败后: snapshot 或 resync |
/// | PRODUCT_ROLLBACK | snapshot | 商品拖拽失败后 |
/// | AVAILABILITY_ROLLBACK | resync | 上下架失败后 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/menu HTTP_PORT=8080 STORE_BACKEND=memory cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 显式指定的数据库路径
    pub database_path: Option<String>,
    pub store_backend: StoreBackend,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub log_retention_days: u64,
    /// broadcast channel 容量
    pub bus_capacity: usize,
    /// 写入失败后的回滚策略
    pub rollback: RollbackPolicies,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        let defaults = RollbackPolicies::default();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/menu".into()),
            http_port: env_parse("HTTP_PORT").unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH").ok(),
            store_backend: env_parse("STORE_BACKEND").unwrap_or(StoreBackend::Sqlite),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON").unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok(),
            log_retention_days: env_parse("LOG_RETENTION_DAYS").unwrap_or(14),
            bus_capacity: env_parse("BUS_CAPACITY").unwrap_or(1024),
            rollback: RollbackPolicies {
                categories: env_parse::<RollbackPolicy>("CATEGORY_ROLLBACK")
                    .unwrap_or(defaults.categories),
                products: env_parse::<RollbackPolicy>("PRODUCT_ROLLBACK")
                    .unwrap_or(defaults.products),
                availability: env_parse::<RollbackPolicy>("AVAILABILITY_ROLLBACK")
                    .unwrap_or(defaults.availability),
            },
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// SQLite 文件路径
    pub fn database_file(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => self.database_dir().join("menu.db"),
        }
    }

    /// 日志目录
    pub fn logs_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(&self.work_dir).join("logs"),
        }
    }

    /// 确保工作目录结构存在
    ///
    /// ```text
    /// {work_dir}/
    /// ├── database/
    /// └── logs/
    /// ```
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        if self.store_backend == StoreBackend::Sqlite {
            if let Some(parent) = self.database_file().parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("sqlite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_rollback_policy_parse() {
        assert_eq!(
            "snapshot".parse::<RollbackPolicy>().unwrap(),
            RollbackPolicy::RestoreSnapshot
        );
        assert_eq!("RESYNC".parse::<RollbackPolicy>().unwrap(), RollbackPolicy::Resync);
        assert!("retry".parse::<RollbackPolicy>().is_err());
    }

    #[test]
    fn test_paths_derive_from_work_dir() {
        let mut config = Config::with_overrides("/tmp/menu-test", 0);
        config.database_path = None;
        config.log_dir = None;
        assert_eq!(config.database_file(), PathBuf::from("/tmp/menu-test/database/menu.db"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/menu-test/logs"));

        config.database_path = Some("/srv/menu.db".into());
        assert_eq!(config.database_file(), PathBuf::from("/srv/menu.db"));
    }

    #[test]
    fn test_ensure_work_dir_structure() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.database_path = None;
        config.log_dir = None;
        config.store_backend = StoreBackend::Sqlite;

        config.ensure_work_dir_structure().unwrap();
        assert!(dir.path().join("database").is_dir());
        assert!(dir.path().join("logs").is_dir());
    }
}
