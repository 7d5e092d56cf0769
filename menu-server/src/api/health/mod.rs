//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 存活检查 + 目录加载状态 |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "catalog": { "status": "ready" },
//!   "categories": 4,
//!   "products": 31,
//!   "gesture": { "phase": "idle" }
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::reorder::{DragPhase, LoadState};

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    catalog: LoadState,
    categories: usize,
    products: usize,
    gesture: DragPhase,
}

/// GET /health
///
/// Always 200; a catalog that failed to load reports `degraded`.
async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let catalog = state.engine.load_state();
    let status = match catalog {
        LoadState::Failed(_) => "degraded",
        _ => "ok",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        catalog,
        categories: state.engine.categories().len(),
        products: state.engine.products().len(),
        gesture: state.engine.gesture_phase(),
    })
}
