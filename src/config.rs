//! Environment-driven configuration

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Extra lifetime given to timer entries past their end time, so a late
/// query still sees "elapsed" instead of "never started".
pub const DEFAULT_TIMER_GRACE: Duration = Duration::from_secs(60);

/// Runtime configuration for the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub db_path: String,
    pub port: u16,
    pub telegram_token: Option<String>,
    pub telegram_api_url: String,
    pub webhook_secret: Option<String>,
    pub timer_grace: Duration,
    pub seed_recipes: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: DEFAULT_PORT,
            telegram_token: None,
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            webhook_secret: None,
            timer_grace: DEFAULT_TIMER_GRACE,
            seed_recipes: true,
        }
    }
}

impl BotConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unparseable values
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            db_path: non_empty("BREW_DB_PATH").unwrap_or(defaults.db_path),
            port: non_empty("BREW_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            telegram_token: non_empty("TELEGRAM_BOT_TOKEN"),
            telegram_api_url: non_empty("TELEGRAM_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.telegram_api_url),
            webhook_secret: non_empty("TELEGRAM_WEBHOOK_SECRET"),
            timer_grace: non_empty("BREW_TIMER_GRACE_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.timer_grace, Duration::from_secs),
            seed_recipes: non_empty("BREW_SEED_RECIPES")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.seed_recipes),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/.brew-guide/brew.db")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
