use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://chatdir.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_api_url: String,
    pub mini_app_url: Option<String>,
    /// JSON array of chats upserted into the catalog at startup.
    pub chats_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            telegram_bot_token: None,
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_owned(),
            mini_app_url: None,
            chats_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            telegram_bot_token: var("TELEGRAM_BOT_TOKEN"),
            telegram_api_url: var("TELEGRAM_API_URL").unwrap_or(defaults.telegram_api_url),
            mini_app_url: var("MINI_APP_URL"),
            chats_file: var("CHATS_FILE").map(PathBuf::from),
        }
    }
}

// unset and blank are the same thing
fn var(key: &str) -> Option<String> {
    dotenv::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
