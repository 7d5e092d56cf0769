//! Product API 模块

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/grouped", get(handler::grouped))
        .route("/reorder", put(handler::reorder))
        .route("/drag", put(handler::begin_drag).delete(handler::cancel_drag))
        .route("/{id}", get(handler::get_by_id).put(handler::update).delete(handler::delete))
        .route("/{id}/availability", put(handler::set_availability))
}
