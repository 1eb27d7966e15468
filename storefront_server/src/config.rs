use std::{env, time::Duration};

use log::*;
use sf_common::{parse_boolean_flag, parse_comma_separated, Secret};
use storefront_engine::{
    db_types::TelegramId,
    helpers::PaymentTarget,
    FlowSettings,
    OperatorAllowList,
};
use telegram_tools::TelegramConfig;

const DEFAULT_SF_HOST: &str = "127.0.0.1";
const DEFAULT_SF_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_KASPI_QR_URL: &str = "/kaspi-qr.png";
const DEFAULT_CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub telegram: TelegramConfig,
    /// Telegram ids of the people allowed to review payments and manage the catalog.
    pub operator_ids: Vec<TelegramId>,
    /// Where customers transfer their payments.
    pub payment_target: PaymentTarget,
    /// The web app opened from the bot's greeting message.
    pub frontend_url: String,
    /// If set, webhook calls must carry this value in the `X-Telegram-Bot-Api-Secret-Token` header.
    pub webhook_secret: Option<Secret<String>>,
    /// If false, init data is parsed but its signature is not checked. **DANGER**. Local development only.
    pub init_data_checks: bool,
    pub catalog_cache_ttl: Duration,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SF_HOST.to_string(),
            port: DEFAULT_SF_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            telegram: TelegramConfig::default(),
            operator_ids: Vec::new(),
            payment_target: PaymentTarget { phone: String::default(), qr_code_url: DEFAULT_KASPI_QR_URL.to_string() },
            frontend_url: String::default(),
            webhook_secret: None,
            init_data_checks: true,
            catalog_cache_ttl: DEFAULT_CATALOG_CACHE_TTL,
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SF_HOST").ok().unwrap_or_else(|| DEFAULT_SF_HOST.into());
        let port = env::var("SF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for SF_PORT. {e} Using the default, {DEFAULT_SF_PORT}, instead.");
                    DEFAULT_SF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SF_PORT);
        let database_url = env::var("SF_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SF_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env::var("SF_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SF_DB_MAX_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        let telegram = TelegramConfig::new_from_env_or_default();
        let operator_ids = env::var("SF_OPERATOR_IDS").map(|s| parse_operator_ids(&s)).unwrap_or_default();
        if operator_ids.is_empty() {
            warn!("🚨️ SF_OPERATOR_IDS is not set. Nobody will be able to review payments.");
        } else {
            let ids = operator_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Payment operators: {ids}");
        }
        let phone = env::var("SF_KASPI_PHONE").ok().unwrap_or_else(|| {
            error!("🪛️ SF_KASPI_PHONE is not set. Customers will not be told where to send their payments.");
            String::default()
        });
        let qr_code_url = env::var("SF_KASPI_QR_URL").ok().unwrap_or_else(|| DEFAULT_KASPI_QR_URL.to_string());
        let frontend_url = env::var("SF_FRONTEND_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SF_FRONTEND_URL is not set. The greeting's shop button will not work.");
            String::default()
        });
        let webhook_secret = env::var("SF_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()).map(Secret::new);
        if webhook_secret.is_none() {
            warn!("🪛️ SF_WEBHOOK_SECRET is not set. Anyone who knows the webhook URL can post bot updates.");
        }
        let init_data_checks = parse_boolean_flag(env::var("SF_INIT_DATA_CHECKS").ok(), true);
        if !init_data_checks {
            warn!("🚨️ Init data signature checks are DISABLED. Anyone can impersonate any user. 🚨️");
        }
        let catalog_cache_ttl = configure_cache_ttl();
        let use_x_forwarded_for = parse_boolean_flag(env::var("SF_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SF_USE_FORWARDED").ok(), false);
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            telegram,
            operator_ids,
            payment_target: PaymentTarget { phone, qr_code_url },
            frontend_url,
            webhook_secret,
            init_data_checks,
            catalog_cache_ttl,
            use_x_forwarded_for,
            use_forwarded,
        }
    }

    pub fn operator_policy(&self) -> OperatorAllowList {
        OperatorAllowList::new(self.operator_ids.iter().copied())
    }

    /// Review requests go to every operator.
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            payment_target: self.payment_target.clone(),
            frontend_url: self.frontend_url.clone(),
            review_chats: self.operator_ids.clone(),
        }
    }
}

fn parse_operator_ids(s: &str) -> Vec<TelegramId> {
    let (ids, invalid) = parse_comma_separated::<TelegramId>(s);
    for item in invalid {
        warn!("🪛️ Ignoring invalid Telegram id ({item}) in SF_OPERATOR_IDS");
    }
    ids
}

fn configure_cache_ttl() -> Duration {
    env::var("SF_CATALOG_CACHE_TTL")
        .map_err(|_| {
            info!(
                "🪛️ SF_CATALOG_CACHE_TTL is not set. Using the default value of {} s.",
                DEFAULT_CATALOG_CACHE_TTL.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for SF_CATALOG_CACHE_TTL. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_CATALOG_CACHE_TTL)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
