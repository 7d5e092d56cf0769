//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::message::SyncAction;
use shared::models::{Category, CategoryCreate, CategoryUpdate, ItemKind, MoveIntent};

use crate::api::{AvailabilityUpdate, DragStart};
use crate::core::ServerState;
use crate::reorder::{DragPhase, MoveOutcome};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "category";

/// GET /api/categories - 获取所有分类 (按排序)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    state.engine.ensure_ready()?;
    Ok(Json(state.engine.categories()))
}

/// GET /api/categories/{id} - 获取单个分类
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    state.engine.ensure_ready()?;
    let category = state
        .engine
        .category(id)
        .ok_or_else(|| AppError::category_not_found(id))?;
    Ok(Json(category))
}

/// POST /api/categories - 创建分类 (追加到末尾)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    let category = state.engine.create_category(payload).await?;

    state
        .broadcast_sync(RESOURCE, SyncAction::Created, category.id, Some(&category))
        .await;

    Ok(Json(category))
}

/// PUT /api/categories/{id} - 更新分类
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    let category = state.engine.update_category(id, payload).await?;

    state
        .broadcast_sync(RESOURCE, SyncAction::Updated, id, Some(&category))
        .await;

    Ok(Json(category))
}

/// DELETE /api/categories/{id} - 删除分类 (商品转为未分类)
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    state.engine.delete(ItemKind::Category, id).await?;

    state
        .broadcast_sync::<()>(RESOURCE, SyncAction::Deleted, id, None)
        .await;

    Ok(Json(true))
}

/// PUT /api/categories/{id}/availability - 上下架
pub async fn set_availability(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AvailabilityUpdate>,
) -> AppResult<Json<Category>> {
    state
        .engine
        .set_availability(ItemKind::Category, id, payload.is_available)
        .await?;
    let category = state
        .engine
        .category(id)
        .ok_or_else(|| AppError::category_not_found(id))?;

    state
        .broadcast_sync(RESOURCE, SyncAction::Updated, id, Some(&category))
        .await;

    Ok(Json(category))
}

/// PUT /api/categories/reorder - 拖拽放下
pub async fn reorder(
    State(state): State<ServerState>,
    Json(intent): Json<MoveIntent>,
) -> AppResult<Json<MoveOutcome>> {
    let outcome = state.engine.reorder_categories(intent).await?;
    Ok(Json(outcome))
}

/// PUT /api/categories/drag - 开始拖拽
pub async fn begin_drag(
    State(state): State<ServerState>,
    Json(payload): Json<DragStart>,
) -> AppResult<Json<DragPhase>> {
    state.engine.begin_drag(ItemKind::Category, payload.active_id)?;
    Ok(Json(state.engine.gesture_phase()))
}

/// DELETE /api/categories/drag - 取消拖拽
pub async fn cancel_drag(State(state): State<ServerState>) -> Json<DragPhase> {
    state.engine.cancel_drag();
    Json(state.engine.gesture_phase())
}
