//! Notification Module
//! 新規注文を Telegram チャットへ通知する（ベストエフォート）

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::models::{Order, OrderType};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("telegram API error {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// チャット通知の送信先
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 整形済みメッセージ（HTML）を送る
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

// ========================================
// Telegram
// ========================================

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Telegram Bot API (sendMessage)
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base.trim_end_matches('/'), self.token);
        let response = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message,
                parse_mode: "HTML",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status, body });
        }

        info!("📨 Telegram notification sent");
        Ok(())
    }
}

/// トークン未設定時の代替（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!("📨 Telegram notification (simulated):\n{}", message);
        Ok(())
    }
}

/// トークンとチャット ID が揃っているときだけ Telegram を使う
pub fn telegram_from_config(config: &AppConfig) -> Option<TelegramNotifier> {
    let token = config.telegram_bot_token.as_deref().filter(|t| !t.is_empty())?;
    let chat_id = config.telegram_chat_id.as_deref().filter(|c| !c.is_empty())?;
    Some(TelegramNotifier::new(&config.telegram_api_base, token, chat_id))
}

/// 設定から通知先を選ぶ
pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn Notifier> {
    match telegram_from_config(config) {
        Some(telegram) => {
            info!("Telegram notifications enabled (chat_id={})", telegram.chat_id);
            Arc::new(telegram)
        }
        None => {
            info!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set, notifications are logged only");
            Arc::new(LogNotifier)
        }
    }
}

// ========================================
// Message
// ========================================

/// 通知メッセージ（Telegram HTML）を組み立てる
pub fn format_order_message(order: &Order) -> String {
    let (emoji, title) = match order.order_type {
        OrderType::B2b => ("🏢", "НОВАЯ ОПТОВАЯ ЗАЯВКА"),
        OrderType::Retail => ("🏠", "НОВЫЙ РОЗНИЧНЫЙ ЗАКАЗ"),
    };

    let mut message = format!("<b>{} {}</b>\n\n", emoji, title);
    message += &format!("<b>Имя:</b> {}\n", escape_html(&order.name));
    message += &format!("<b>Телефон:</b> {}\n", escape_html(&order.phone));
    if let Some(email) = &order.email {
        message += &format!("<b>Email:</b> {}\n", escape_html(email));
    }
    if let Some(address) = &order.address {
        message += &format!("<b>Адрес:</b> {}\n", escape_html(address));
    }
    if let Some(comment) = &order.comment {
        message += &format!("<b>Комментарий:</b> {}\n", escape_html(comment));
    }
    if let Some(total) = order.total {
        message += &format!("<b>Сумма:</b> {} ₽\n", total);
    }

    if !order.products.is_empty() {
        message += "\n<b>Товары:</b>\n";
        for item in &order.products {
            message += &format!("- {} ({} шт.)\n", escape_html(&item.name), item.quantity);
        }
    }

    message
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItem, OrderStatus};
    use axum::{http::Uri, Json};
    use clap::Parser;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    /// sendMessage の代わりに受けたリクエストを記録するスタブ
    async fn spawn_bot_api(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let app = axum::Router::new().fallback(move |uri: Uri, Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.lock().expect("lock").push((uri.path().to_string(), body));
                (status, Json(json!({ "ok": status.is_success() })))
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        (format!("http://{}", addr), captured)
    }

    fn config(args: &[&str]) -> AppConfig {
        let mut argv = vec!["seafood-store"];
        argv.extend_from_slice(args);
        AppConfig::parse_from(argv)
    }

    fn order(order_type: OrderType) -> Order {
        Order {
            id: "o1".to_string(),
            order_type,
            name: "Иван".to_string(),
            phone: "+7 (999) 123-45-67".to_string(),
            email: None,
            address: None,
            comment: None,
            products: Vec::new(),
            total: None,
            status: OrderStatus::New,
            created_at_ms: 0,
        }
    }

    #[test]
    fn retail_message_with_items() {
        let mut o = order(OrderType::Retail);
        o.address = Some("Москва, ул. Ленина 1".to_string());
        o.total = Some(3160.0);
        o.products = vec![
            OrderItem { name: "Стейк сёмги".to_string(), quantity: 2 },
            OrderItem { name: "Филе трески".to_string(), quantity: 1 },
        ];

        let expected = "<b>🏠 НОВЫЙ РОЗНИЧНЫЙ ЗАКАЗ</b>\n\n\
            <b>Имя:</b> Иван\n\
            <b>Телефон:</b> +7 (999) 123-45-67\n\
            <b>Адрес:</b> Москва, ул. Ленина 1\n\
            <b>Сумма:</b> 3160 ₽\n\
            \n<b>Товары:</b>\n\
            - Стейк сёмги (2 шт.)\n\
            - Филе трески (1 шт.)\n";
        assert_eq!(format_order_message(&o), expected);
    }

    #[test]
    fn b2b_message_skips_absent_fields() {
        let mut o = order(OrderType::B2b);
        o.email = Some("buyer@example.com".to_string());
        o.comment = Some("Запрос прайса".to_string());

        let message = format_order_message(&o);
        assert!(message.starts_with("<b>🏢 НОВАЯ ОПТОВАЯ ЗАЯВКА</b>\n\n"));
        assert!(message.contains("<b>Email:</b> buyer@example.com\n"));
        assert!(message.contains("<b>Комментарий:</b> Запрос прайса\n"));
        assert!(!message.contains("Адрес"));
        assert!(!message.contains("Сумма"));
        assert!(!message.contains("Товары"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut o = order(OrderType::Retail);
        o.name = "<script>&".to_string();
        assert!(format_order_message(&o).contains("<b>Имя:</b> &lt;script&gt;&amp;\n"));
    }

    #[test]
    fn fractional_total_keeps_decimals() {
        let mut o = order(OrderType::Retail);
        o.total = Some(990.5);
        assert!(format_order_message(&o).contains("<b>Сумма:</b> 990.5 ₽\n"));
    }

    #[tokio::test]
    async fn telegram_posts_html_message_to_bot_endpoint() {
        let (base, captured) = spawn_bot_api(StatusCode::OK).await;
        let notifier = TelegramNotifier::new(format!("{}/", base), "123:abc", "-100500");

        notifier.send("<b>🏠 НОВЫЙ РОЗНИЧНЫЙ ЗАКАЗ</b>").await.expect("sent");

        let requests = captured.lock().expect("lock").clone();
        assert_eq!(requests.len(), 1);
        let (path, body) = &requests[0];
        assert_eq!(path, "/bot123:abc/sendMessage");
        assert_eq!(
            body,
            &json!({
                "chat_id": "-100500",
                "text": "<b>🏠 НОВЫЙ РОЗНИЧНЫЙ ЗАКАЗ</b>",
                "parse_mode": "HTML"
            })
        );
    }

    #[tokio::test]
    async fn telegram_error_status_is_api_error() {
        let (base, captured) = spawn_bot_api(StatusCode::UNAUTHORIZED).await;
        let notifier = TelegramNotifier::new(base, "bad", "-100500");

        let err = notifier.send("hello").await.expect_err("rejected");
        match err {
            NotifyError::Api { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("\"ok\":false"), "{}", body);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
        assert_eq!(captured.lock().expect("lock").len(), 1);
    }

    #[test]
    fn telegram_needs_both_token_and_chat() {
        assert!(telegram_from_config(&config(&[])).is_none());
        assert!(telegram_from_config(&config(&["--telegram-bot-token", "123:abc"])).is_none());
        assert!(telegram_from_config(&config(&["--telegram-chat-id=-100500"])).is_none());
        assert!(telegram_from_config(&config(&[
            "--telegram-bot-token",
            "",
            "--telegram-chat-id=-100500"
        ]))
        .is_none());

        let telegram = telegram_from_config(&config(&[
            "--telegram-bot-token",
            "123:abc",
            "--telegram-chat-id=-100500",
            "--telegram-api-base",
            "http://localhost:8081",
        ]))
        .expect("configured");
        assert_eq!(telegram.api_base, "http://localhost:8081");
        assert_eq!(telegram.token, "123:abc");
        assert_eq!(telegram.chat_id, "-100500");
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.send("hello").await.is_ok());
    }
}
