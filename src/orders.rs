//! Orders Module
//! 注文の保存と通知（保存 → 通知 の 2 段階、トランザクションではない）

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{CreateOrderRequest, Order, OrderItem, OrderRow, OrderStatus, OrderType};
use crate::notify::{format_order_message, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("invalid order: {0}")]
    Invalid(&'static str),
    #[error("order not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("malformed products column: {0}")]
    Encoding(#[from] serde_json::Error),
}

// ========================================
// NewOrder
// ========================================

/// 保存前の注文（id と作成時刻はサーバ側で付与）
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_type: OrderType,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub comment: Option<String>,
    pub products: Vec<OrderItem>,
    pub total: Option<f64>,
}

impl NewOrder {
    /// サーバ側の最小限チェック
    ///
    /// 形式の検証はフォーム側で行う。ここでは名前と電話番号が空でないことだけを見る。
    pub fn from_request(req: CreateOrderRequest) -> Result<Self, OrderError> {
        let name = req.name.trim().to_string();
        let phone = req.phone.trim().to_string();
        if name.is_empty() {
            return Err(OrderError::Invalid("name is required"));
        }
        if phone.is_empty() {
            return Err(OrderError::Invalid("phone is required"));
        }

        Ok(Self {
            order_type: req.order_type.unwrap_or_default(),
            name,
            phone,
            email: non_blank(req.email),
            address: non_blank(req.address),
            comment: non_blank(req.comment),
            products: req.cart.unwrap_or_default(),
            // 0 は「合計なし」と同じ扱い
            total: req.total.filter(|t| *t != 0.0),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ========================================
// Repository
// ========================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 1 行挿入して保存済みの注文を返す（status = NEW）
    async fn insert(&self, order: NewOrder) -> Result<Order, OrderError>;

    /// 新しい順
    async fn list(&self) -> Result<Vec<Order>, OrderError>;

    async fn get(&self, id: &str) -> Result<Option<Order>, OrderError>;

    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, OrderError>;
}

#[derive(Debug, Clone)]
pub struct SqliteOrderRepository {
    db: DbPool,
}

impl SqliteOrderRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn insert(&self, order: NewOrder) -> Result<Order, OrderError> {
        let id = Uuid::new_v4().to_string();
        let now_ms = chrono::Utc::now().timestamp_millis();
        let products = if order.products.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&order.products)?)
        };

        sqlx::query(r#"
            INSERT INTO orders (
                id, order_type, name, phone, email, address, comment,
                products, total, status, created_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#)
        .bind(&id)
        .bind(order.order_type)
        .bind(&order.name)
        .bind(&order.phone)
        .bind(&order.email)
        .bind(&order.address)
        .bind(&order.comment)
        .bind(&products)
        .bind(order.total)
        .bind(OrderStatus::New)
        .bind(now_ms)
        .execute(&self.db)
        .await?;

        Ok(Order {
            id,
            order_type: order.order_type,
            name: order.name,
            phone: order.phone,
            email: order.email,
            address: order.address,
            comment: order.comment,
            products: order.products,
            total: order.total,
            status: OrderStatus::New,
            created_at_ms: now_ms,
        })
    }

    async fn list(&self) -> Result<Vec<Order>, OrderError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT * FROM orders ORDER BY created_at_ms DESC, rowid DESC"
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| Order::try_from(row).map_err(OrderError::from))
            .collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, OrderError> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Order::try_from).transpose()?)
    }

    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, OrderError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrderError::NotFound);
        }

        self.get(id).await?.ok_or(OrderError::NotFound)
    }
}

// ========================================
// Pipeline
// ========================================

/// 注文受付パイプライン
///
/// 記録の正は DB。通知は補助チャネルで、失敗しても受付結果は変わらない。
#[derive(Clone)]
pub struct OrderPipeline {
    repo: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
}

impl OrderPipeline {
    pub fn new(repo: Arc<dyn OrderRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// 保存 → 通知
    ///
    /// 保存に失敗した場合は通知しない。通知の失敗はログのみ。
    pub async fn submit(&self, req: CreateOrderRequest) -> Result<Order, OrderError> {
        let new_order = NewOrder::from_request(req)?;
        let order = self.repo.insert(new_order).await?;
        info!("🛒 Order created: id={} type={}", order.id, order.order_type.as_str());

        let message = format_order_message(&order);
        if let Err(e) = self.notifier.send(&message).await {
            warn!("⚠️  Order notification failed (order {} is saved): {}", order.id, e);
        }

        Ok(order)
    }

    pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
        self.repo.list().await
    }

    /// ステータス変更（遷移チェックなし）
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, OrderError> {
        let order = self.repo.update_status(id, status).await?;
        info!("📝 Order {} status -> {}", id, status.as_str());
        Ok(order)
    }
}
