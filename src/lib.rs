//! Seafood Store
//! 小売 / 卸売 水産物ストアの注文受付サービスとセッション側ロジック

pub mod cart;
pub mod client;
pub mod config;
pub mod db;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod orders;

use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::DbPool;
use crate::notify::Notifier;
use crate::orders::{OrderPipeline, SqliteOrderRepository};

/// ハンドラ共有状態
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderPipeline,
}

impl AppState {
    pub fn new(db: DbPool, notifier: Arc<dyn Notifier>) -> Self {
        let repo = Arc::new(SqliteOrderRepository::new(db));
        Self {
            orders: OrderPipeline::new(repo, notifier),
        }
    }
}

/// ルーター構築
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route(
            "/api/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/api/orders/:id", patch(handlers::orders::update_order_status))
        .layer(axum::middleware::from_fn(middleware::admin_gate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
