//! Order API Client
//! フォームから POST /api/orders を呼び出す側（送信 → アラート → 成功時のみクリア）

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::cart::CartStore;
use crate::forms::{CheckoutForm, LeadForm, ValidationErrors, ALERT_FAILED};
use crate::models::{CreateOrderRequest, CreateOrderResponse};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected order: {0}")]
    Rejected(StatusCode),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, req: &CreateOrderRequest) -> Result<CreateOrderResponse, ClientError>;
}

/// reqwest による実装
#[derive(Debug, Clone)]
pub struct HttpOrderClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderApi for HttpOrderClient {
    async fn create_order(&self, req: &CreateOrderRequest) -> Result<CreateOrderResponse, ClientError> {
        let url = format!("{}/api/orders", self.base_url.trim_end_matches('/'));
        let response = self.client.post(&url).json(req).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Rejected(status));
        }

        Ok(response.json::<CreateOrderResponse>().await?)
    }
}

// ========================================
// Submission
// ========================================

/// 送信結果（ブロッキングアラートとして表示する）
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// 検証エラー。リクエストは送っていない
    Invalid(ValidationErrors),
    Accepted { order_id: String, alert: &'static str },
    /// ネットワーク / サーバの区別なく同じアラート
    Failed { alert: &'static str },
}

impl SubmitOutcome {
    pub fn alert(&self) -> Option<&'static str> {
        match self {
            SubmitOutcome::Invalid(_) => None,
            SubmitOutcome::Accepted { alert, .. } | SubmitOutcome::Failed { alert } => Some(*alert),
        }
    }
}

/// カートに依存しないフォームを送信する
///
/// リトライはしない。成功時のみフォームをリセットする。
pub async fn submit_lead<A, F>(api: &A, form: &mut F) -> SubmitOutcome
where
    A: OrderApi + ?Sized,
    F: LeadForm,
{
    if let Err(errors) = form.check() {
        return SubmitOutcome::Invalid(errors);
    }

    match api.create_order(&form.to_request()).await {
        Ok(resp) => {
            let alert = form.success_alert();
            form.reset();
            info!("✅ Lead submitted: order_id={}", resp.order_id);
            SubmitOutcome::Accepted { order_id: resp.order_id, alert }
        }
        Err(e) => {
            warn!("❌ Lead submission failed: {}", e);
            SubmitOutcome::Failed { alert: ALERT_FAILED }
        }
    }
}

/// カートの注文確定。成功時はフォームとカートの両方をクリアする
pub async fn submit_checkout<A>(api: &A, form: &mut CheckoutForm, cart: &mut CartStore) -> SubmitOutcome
where
    A: OrderApi + ?Sized,
{
    if let Err(errors) = form.check(cart) {
        return SubmitOutcome::Invalid(errors);
    }

    match api.create_order(&form.to_request(cart)).await {
        Ok(resp) => {
            let alert = form.success_alert();
            form.reset();
            cart.clear_cart();
            info!("✅ Checkout submitted: order_id={}", resp.order_id);
            SubmitOutcome::Accepted { order_id: resp.order_id, alert }
        }
        Err(e) => {
            warn!("❌ Checkout submission failed: {}", e);
            SubmitOutcome::Failed { alert: ALERT_FAILED }
        }
    }
}
