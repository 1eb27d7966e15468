use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::{ApiResponse, InlineKeyboardMarkup, Message, TelegramApiError, TelegramConfig};

/// A thin client over the Telegram Bot HTTP API.
///
/// Every method is a single POST to `{api_base}/bot{token}/{method}` with a JSON body. Cloning is cheap; the
/// underlying connection pool is shared.
#[derive(Clone)]
pub struct TelegramApi {
    config: TelegramConfig,
    client: Arc<Client>,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TelegramApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_base, self.config.bot_token.reveal())
    }

    /// Calls a Bot API method and unwraps the `{ ok, result }` envelope.
    pub async fn call<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T, TelegramApiError> {
        let url = self.url(method);
        // Never log the url; it carries the bot token
        trace!("📬️ Calling Bot API method {method}");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramApiError::RestRequestError(e.without_url().to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.map_err(|e| TelegramApiError::RestResponseError(e.to_string()))?;
            return Err(TelegramApiError::QueryError { status: status.as_u16(), message });
        }
        let envelope = response
            .json::<ApiResponse<T>>()
            .await
            .map_err(|e| TelegramApiError::JsonError(e.without_url().to_string()))?;
        match envelope {
            ApiResponse { ok: true, result: Some(result), .. } => {
                trace!("📬️ {method} successful");
                Ok(result)
            },
            ApiResponse { description, .. } => {
                Err(TelegramApiError::BotApiError(description.unwrap_or_else(|| format!("{method} returned no result"))))
            },
        }
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramApiError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(kb) = keyboard {
            body["reply_markup"] = json!(kb);
        }
        let msg = self.call::<Message, _>("sendMessage", &body).await?;
        debug!("📬️ Message {} sent to chat {chat_id}", msg.message_id);
        Ok(msg)
    }

    /// Sends a photo that Telegram already has, identified by its `file_id`.
    pub async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramApiError> {
        let mut body = json!({ "chat_id": chat_id, "photo": file_id, "caption": caption });
        if let Some(kb) = keyboard {
            body["reply_markup"] = json!(kb);
        }
        let msg = self.call::<Message, _>("sendPhoto", &body).await?;
        debug!("📬️ Photo message {} sent to chat {chat_id}", msg.message_id);
        Ok(msg)
    }

    /// Replaces the caption of a previously sent message. Inline keyboards are dropped, since the new markup is
    /// omitted from the request.
    pub async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
    ) -> Result<(), TelegramApiError> {
        let body = json!({ "chat_id": chat_id, "message_id": message_id, "caption": caption });
        // Bot API returns either the edited Message or `true`
        let _ = self.call::<serde_json::Value, _>("editMessageCaption", &body).await?;
        debug!("📬️ Caption of message {message_id} in chat {chat_id} edited");
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TelegramApiError> {
        let mut body = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            body["text"] = json!(text);
            body["show_alert"] = json!(show_alert);
        }
        let _ = self.call::<bool, _>("answerCallbackQuery", &body).await?;
        trace!("📬️ Callback query {callback_query_id} answered");
        Ok(())
    }
}
