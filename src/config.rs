//! Configuration
//! 環境変数（.env 可）またはコマンドライン引数から読み込む

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "seafood-store", about = "Seafood storefront order API", long_about = None)]
pub struct AppConfig {
    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: String,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "data/store.db")]
    pub database_path: String,

    /// Telegram bot token; notifications are only logged when unset
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat that receives new orders (group ids are negative)
    #[arg(long, env = "TELEGRAM_CHAT_ID", allow_hyphen_values = true)]
    pub telegram_chat_id: Option<String>,

    #[arg(long, env = "TELEGRAM_API_BASE", default_value = "https://api.telegram.org")]
    pub telegram_api_base: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = AppConfig::parse_from([
            "seafood-store",
            "--bind-addr",
            "127.0.0.1:8080",
            "--telegram-bot-token",
            "123:abc",
            "--telegram-chat-id",
            "-100500",
        ]);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.telegram_bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.telegram_chat_id.as_deref(), Some("-100500"));
    }

    #[test]
    fn negative_group_chat_id_is_accepted() {
        let separate = AppConfig::try_parse_from(["seafood-store", "--telegram-chat-id", "-1001234567890"])
            .expect("separate value");
        assert_eq!(separate.telegram_chat_id.as_deref(), Some("-1001234567890"));

        let joined = AppConfig::try_parse_from(["seafood-store", "--telegram-chat-id=-1001234567890"])
            .expect("joined value");
        assert_eq!(joined.telegram_chat_id, separate.telegram_chat_id);
    }
}
