//! 目录重新加载
//!
//! 引擎加载失败 (Failed) 或怀疑本地状态与存储不一致时使用。

use axum::{Json, Router, extract::State, routing::post};

use crate::core::ServerState;
use crate::reorder::LoadState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/catalog/reload", post(reload))
}

/// POST /api/catalog/reload - 从存储重新加载引擎与菜单副本
async fn reload(State(state): State<ServerState>) -> AppResult<Json<LoadState>> {
    state.engine.load().await?;
    state.feed.refresh().await?;
    tracing::info!("Catalog reloaded on request");
    Ok(Json(state.engine.load_state()))
}
