//! Admin Gate
//! 管理者用 API を admin_token クッキーの有無で保護する（クッキーの発行はここでは扱わない）

use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use crate::handlers::orders::ErrorResponse;

pub const ADMIN_COOKIE: &str = "admin_token";

/// 保護対象のメソッド・パスか
pub fn is_protected(method: &Method, path: &str) -> bool {
    let order_view = path.starts_with("/api/orders") && *method == Method::GET;
    let order_status_update = path.starts_with("/api/orders/") && *method == Method::PATCH;
    order_view || order_status_update
}

/// Cookie ヘッダに指定名のクッキーがあるか
fn has_cookie(req: &Request, name: &str) -> bool {
    req.headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(k, v)| k == name && !v.is_empty())
}

pub async fn admin_gate(req: Request, next: Next) -> Response {
    if is_protected(req.method(), req.uri().path()) && !has_cookie(&req, ADMIN_COOKIE) {
        warn!("🔒 Unauthorized {} {}", req.method(), req.uri().path());
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                success: false,
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response();
    }

    next.run(req).await
}
