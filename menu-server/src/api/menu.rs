//! 公开菜单路由

use axum::{Json, Router, extract::State, routing::get};

use crate::core::ServerState;
use crate::menu::PublicMenu;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/menu", get(public_menu))
}

/// GET /api/menu - 访客看到的菜单 (来自实时 feed)
async fn public_menu(State(state): State<ServerState>) -> AppResult<Json<PublicMenu>> {
    let profile = state.store.get_profile().await?;
    Ok(Json(PublicMenu {
        profile,
        view: state.feed.view(),
    }))
}
