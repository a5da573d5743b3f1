//! Data Models
//! Order / OrderItem などのデータ構造定義（API ワイヤ形式と DB 行）

use serde::{Deserialize, Serialize};

// ========================================
// Enums
// ========================================

/// 注文種別（小売 / 卸売）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Retail,
    #[serde(rename = "B2B")]
    #[sqlx(rename = "B2B")]
    B2b,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Retail => "RETAIL",
            OrderType::B2b => "B2B",
        }
    }
}

/// 注文ステータス
///
/// 管理者のみが変更する。遷移の制約はなく、どの状態からどの状態へも移れる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    InWork,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::InWork => "IN_WORK",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

// ========================================
// Order
// ========================================

/// 注文に添付される商品（名前と数量のみ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

/// Order (DB row)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: String,
    pub order_type: OrderType,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub comment: Option<String>,
    pub products: Option<String>, // JSON: [{name, quantity}]
    pub total: Option<f64>,
    pub status: OrderStatus,
    pub created_at_ms: i64,
}

/// Order（products を展開済み）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub comment: Option<String>,
    pub products: Vec<OrderItem>,
    pub total: Option<f64>,
    pub status: OrderStatus,
    /// Unix ミリ秒
    #[serde(rename = "createdAt")]
    pub created_at_ms: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = serde_json::Error;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let products = match row.products.as_deref() {
            Some(json) => serde_json::from_str(json)?,
            None => Vec::new(),
        };
        Ok(Self {
            id: row.id,
            order_type: row.order_type,
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            comment: row.comment,
            products,
            total: row.total,
            status: row.status,
            created_at_ms: row.created_at_ms,
        })
    }
}

/// POST /api/orders リクエスト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<OrderItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

/// POST /api/orders レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: String,
}

/// PATCH /api/orders/:id リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
