//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::message::SyncAction;
use shared::models::{ItemKind, MoveIntent, Product, ProductCreate, ProductUpdate};

use crate::api::{AvailabilityUpdate, DragStart};
use crate::core::ServerState;
use crate::reorder::{DragPhase, MoveOutcome, ProductGroup};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "product";

/// GET /api/products - 获取所有商品 (按排序)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    state.engine.ensure_ready()?;
    Ok(Json(state.engine.products()))
}

/// GET /api/products/grouped - 按分类分组 (未分类在最后)
pub async fn grouped(State(state): State<ServerState>) -> AppResult<Json<Vec<ProductGroup>>> {
    state.engine.ensure_ready()?;
    Ok(Json(state.engine.grouped_products()))
}

/// GET /api/products/{id} - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    state.engine.ensure_ready()?;
    let product = state
        .engine
        .product(id)
        .ok_or_else(|| AppError::product_not_found(id))?;
    Ok(Json(product))
}

/// POST /api/products - 创建商品 (追加到所属分类末尾)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let product = state.engine.create_product(payload).await?;

    state
        .broadcast_sync(RESOURCE, SyncAction::Created, product.id, Some(&product))
        .await;

    Ok(Json(product))
}

/// PUT /api/products/{id} - 更新商品
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let product = state.engine.update_product(id, payload).await?;

    state
        .broadcast_sync(RESOURCE, SyncAction::Updated, id, Some(&product))
        .await;

    Ok(Json(product))
}

/// DELETE /api/products/{id} - 删除商品
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    state.engine.delete(ItemKind::Product, id).await?;

    state
        .broadcast_sync::<()>(RESOURCE, SyncAction::Deleted, id, None)
        .await;

    Ok(Json(true))
}

/// PUT /api/products/{id}/availability - 上下架
pub async fn set_availability(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AvailabilityUpdate>,
) -> AppResult<Json<Product>> {
    state
        .engine
        .set_availability(ItemKind::Product, id, payload.is_available)
        .await?;
    let product = state
        .engine
        .product(id)
        .ok_or_else(|| AppError::product_not_found(id))?;

    state
        .broadcast_sync(RESOURCE, SyncAction::Updated, id, Some(&product))
        .await;

    Ok(Json(product))
}

/// PUT /api/products/reorder - 拖拽放下 (排序或换分类)
pub async fn reorder(
    State(state): State<ServerState>,
    Json(intent): Json<MoveIntent>,
) -> AppResult<Json<MoveOutcome>> {
    let outcome = state.engine.reorder_or_reparent_products(intent).await?;
    Ok(Json(outcome))
}

/// PUT /api/products/drag - 开始拖拽
pub async fn begin_drag(
    State(state): State<ServerState>,
    Json(payload): Json<DragStart>,
) -> AppResult<Json<DragPhase>> {
    state.engine.begin_drag(ItemKind::Product, payload.active_id)?;
    Ok(Json(state.engine.gesture_phase()))
}

/// DELETE /api/products/drag - 取消拖拽
pub async fn cancel_drag(State(state): State<ServerState>) -> Json<DragPhase> {
    state.engine.cancel_drag();
    Json(state.engine.gesture_phase())
}
