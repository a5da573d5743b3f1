//! Database Module
//! SQLite を使用した orders の管理

use std::time::Duration;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use tracing::info;

/// データベース接続プール
pub type DbPool = Pool<Sqlite>;

/// データベースを初期化
pub async fn init_db(db_path: &str) -> Result<DbPool> {
    // SQLite接続文字列
    let db_url = format!("sqlite:{}?mode=rwc", db_path);

    info!("Initializing database: {}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    create_schema(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// インメモリ DB（テスト・ローカル確認用）
///
/// 接続ごとに別の DB になるため、接続は 1 本に固定して破棄させない。
pub async fn init_memory_db() -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// スキーマ作成
async fn create_schema(pool: &DbPool) -> Result<()> {
    // orders テーブル
    sqlx::query(r#"
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            order_type TEXT NOT NULL DEFAULT 'RETAIL',
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT,
            address TEXT,
            comment TEXT,
            products TEXT,
            total REAL,
            status TEXT NOT NULL DEFAULT 'NEW',
            created_at_ms INTEGER NOT NULL
        )
    "#)
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_created ON orders(created_at_ms)")
        .execute(pool).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)")
        .execute(pool).await?;

    Ok(())
}
