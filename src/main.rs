use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use seafood_store::{build_router, config::AppConfig, db, notify, AppState};

// ========================================
// メイン
// ========================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env があれば読み込む（なくてもよい）
    let _env = dotenvy::dotenv();

    // ログ初期化
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::parse();

    if let Some(dir) = Path::new(&config.database_path).parent() {
        if !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {:?}", dir))?;
        }
    }

    let pool = db::init_db(&config.database_path).await?;
    let notifier = notify::notifier_from_config(&config);
    let state = Arc::new(AppState::new(pool, notifier));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("🚀 Seafood Store API listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
