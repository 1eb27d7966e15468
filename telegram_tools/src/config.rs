use log::*;
use sf_common::Secret;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Secret<String>,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self::new(Secret::default())
    }
}

impl TelegramConfig {
    pub fn new(bot_token: Secret<String>) -> Self {
        Self { bot_token, api_base: DEFAULT_API_BASE.to_string() }
    }

    pub fn new_from_env_or_default() -> Self {
        let bot_token = Secret::new(std::env::var("SF_BOT_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ SF_BOT_TOKEN not set. Outbound Telegram messages will fail.");
            String::default()
        }));
        let api_base = std::env::var("SF_TELEGRAM_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self { bot_token, api_base }
    }
}
