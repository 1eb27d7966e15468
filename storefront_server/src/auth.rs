//! Telegram Web App authentication.
//!
//! The web app receives an `initData` query string from Telegram and passes it to every API call in the
//! `X-Telegram-Init-Data` header. Telegram signs the string with a key derived from the bot token:
//!
//! 1. The fields, except `hash`, are sorted by key and joined as `key=value` lines (the *data-check string*).
//! 2. The secret key is `HMAC_SHA256(key = "WebAppData", message = bot_token)`.
//! 3. `hash` is the hex encoding of `HMAC_SHA256(key = secret_key, message = data_check_string)`.
//!
//! A request whose init data validates carries a [`TelegramUser`], which handlers receive as an extractor.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use hmac::{Hmac, Mac};
use log::*;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use storefront_engine::db_types::{Customer, TelegramId};

use crate::errors::{AuthError, ServerError};

type HmacSha256 = Hmac<Sha256>;

pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";
const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// The user that the web app was opened by, as vouched for by Telegram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl TelegramUser {
    pub fn telegram_id(&self) -> TelegramId {
        TelegramId::from(self.id)
    }
}

impl From<&TelegramUser> for Customer {
    fn from(user: &TelegramUser) -> Self {
        Customer {
            telegram_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

impl FromRequest for TelegramUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<TelegramUser>().cloned();
        ready(user.ok_or(ServerError::AuthenticationError(AuthError::MissingInitData)))
    }
}

/// Checks the signature of `init_data` against the bot token and returns the user it carries.
pub fn validate_init_data(init_data: &str, bot_token: &str) -> Result<TelegramUser, AuthError> {
    if bot_token.is_empty() {
        warn!("🔐️ No bot token is configured, so init data cannot be validated");
        return Err(AuthError::InvalidInitData("init data cannot be validated".into()));
    }
    let mut pairs = parse_pairs(init_data);
    let hash = take_field(&mut pairs, "hash")
        .ok_or_else(|| AuthError::PoorlyFormattedInitData("the hash field is missing".into()))?;
    let hash = hex::decode(hash).map_err(|e| AuthError::PoorlyFormattedInitData(format!("invalid hash. {e}")))?;
    let check_string = data_check_string(&pairs);
    let mut mac = HmacSha256::new_from_slice(&secret_key(bot_token))
        .map_err(|e| AuthError::InvalidInitData(e.to_string()))?;
    mac.update(check_string.as_bytes());
    mac.verify_slice(&hash).map_err(|_| AuthError::InvalidInitData("signature mismatch".into()))?;
    user_from_pairs(&pairs)
}

/// Reads the user from `init_data` without checking its signature.
pub fn parse_init_data(init_data: &str) -> Result<TelegramUser, AuthError> {
    user_from_pairs(&parse_pairs(init_data))
}

/// Computes the `hash` field for a set of init data fields. The `hash` field itself, if present, is ignored.
pub fn init_data_hash(fields: &[(String, String)], bot_token: &str) -> String {
    let fields = fields.iter().filter(|(k, _)| k != "hash").cloned().collect::<Vec<_>>();
    // Any key length is acceptable for HMAC
    let Ok(mut mac) = HmacSha256::new_from_slice(&secret_key(bot_token)) else { return String::default() };
    mac.update(data_check_string(&fields).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn secret_key(bot_token: &str) -> Vec<u8> {
    match HmacSha256::new_from_slice(WEB_APP_DATA_KEY) {
        Ok(mut mac) => {
            mac.update(bot_token.as_bytes());
            mac.finalize().into_bytes().to_vec()
        },
        Err(_) => Vec::new(),
    }
}

fn parse_pairs(init_data: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(init_data.as_bytes()).into_owned().collect()
}

fn take_field(pairs: &mut Vec<(String, String)>, key: &str) -> Option<String> {
    let pos = pairs.iter().position(|(k, _)| k == key)?;
    Some(pairs.remove(pos).1)
}

fn data_check_string(pairs: &[(String, String)]) -> String {
    let mut sorted = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>();
    sorted.sort();
    sorted.join("\n")
}

fn user_from_pairs(pairs: &[(String, String)]) -> Result<TelegramUser, AuthError> {
    let user = pairs
        .iter()
        .find_map(|(k, v)| (k == "user").then_some(v))
        .ok_or_else(|| AuthError::PoorlyFormattedInitData("the user field is missing".into()))?;
    serde_json::from_str::<TelegramUser>(user)
        .map_err(|e| AuthError::PoorlyFormattedInitData(format!("invalid user field. {e}")))
}
