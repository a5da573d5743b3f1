//! Orders API Handlers
//! /api/orders エンドポイント

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::models::{CreateOrderRequest, CreateOrderResponse, Order, UpdateOrderStatusRequest};
use crate::orders::OrderError;
use crate::AppState;

// ========================================
// Response Types
// ========================================

#[derive(Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<Order>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

// ========================================
// Handlers
// ========================================

/// POST /api/orders - 注文・リード受付（公開）
///
/// 保存に成功すれば通知の成否に関係なく success を返す。
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<CreateOrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(rejected_body)?;
    let order = state.orders.submit(req).await.map_err(|e| match e {
        OrderError::Invalid(msg) => error_response(StatusCode::BAD_REQUEST, msg.to_string()),
        other => {
            error!("❌ Order POST error: {}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process order".to_string(),
            )
        }
    })?;

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: order.id,
    }))
}

/// GET /api/orders - 注文一覧（管理者のみ）
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OrderListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let orders = state.orders.list().await.map_err(|e| {
        error!("❌ Order list error: {}", e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch orders".to_string(),
        )
    })?;

    let total = orders.len();
    Ok(Json(OrderListResponse {
        success: true,
        orders,
        total,
    }))
}

/// PATCH /api/orders/:id - ステータス変更（管理者のみ、遷移チェックなし）
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> Result<Json<OrderDetailResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(rejected_body)?;
    let order = state
        .orders
        .update_status(&id, req.status)
        .await
        .map_err(|e| match e {
            OrderError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "Order not found".to_string())
            }
            other => {
                error!("❌ Order PATCH error: {}", other);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update order".to_string(),
                )
            }
        })?;

    Ok(Json(OrderDetailResponse {
        success: true,
        order,
    }))
}

// ========================================
// Helper Functions
// ========================================

/// エラーレスポンス生成
fn error_response(status: StatusCode, message: String) -> (StatusCode, Json<ErrorResponse>) {
    warn!("API Error: {}", message);
    (status, Json(ErrorResponse { success: false, error: message }))
}

/// JSON ボディの読み取り失敗も同じエラー形式で返す
fn rejected_body(rejection: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    error_response(rejection.status(), rejection.body_text())
}
