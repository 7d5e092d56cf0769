//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`categories`] - 分类管理接口 (含拖拽排序)
//! - [`products`] - 商品管理接口 (含拖拽排序 / 换分类)
//! - [`menu`] - 公开菜单
//! - [`profile`] - 菜单外观设置
//! - [`catalog`] - 目录重新加载

pub mod catalog;
pub mod categories;
pub mod health;
pub mod menu;
pub mod products;
pub mod profile;

use axum::{Router, middleware};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// PUT /{id}/availability body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityUpdate {
    pub is_available: bool,
}

/// PUT /drag body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DragStart {
    pub active_id: i64,
}

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(menu::router())
        .merge(profile::router())
        .merge(catalog::router())
}

/// Router with state and Tower middleware applied
pub fn build_service(state: ServerState) -> Router {
    build_app()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}
