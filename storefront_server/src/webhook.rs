//! The Telegram bot webhook.
//!
//! Telegram posts every bot update here. Updates are converted into transport-neutral [`BotEvent`]s and handed to the
//! order flow. Updates the storefront has no use for (plain text, stickers, edits) are acknowledged and dropped.
//!
//! Telegram retries updates that are not answered with a 2xx status. So the webhook only fails when a dependency (the
//! database) fails; business refusals are reported to the user in the chat and the update is still acknowledged.
use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use storefront_engine::{
    bot_objects::{BotEvent, BotOutcome, CallbackAction, MessageRef},
    db_types::TelegramId,
    Notifier,
    OrderFlowApi,
    StorefrontDatabase,
};
use telegram_tools::Update;

use crate::{
    config::ServerOptions,
    data_objects::WebhookSecret,
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
    route,
};

pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Converts a bot update into the event the order flow understands. Returns `None` for updates that carry nothing for
/// the storefront.
pub fn bot_event_from_update(update: &Update) -> Option<BotEvent> {
    if let Some(query) = &update.callback_query {
        let action = query.data.as_deref().and_then(|d| d.parse::<CallbackAction>().ok());
        let origin = query.message.as_ref().map(|m| MessageRef {
            chat: TelegramId::from(m.chat.id),
            message_id: m.message_id,
            caption: m.caption.clone(),
        });
        return Some(BotEvent::ButtonTap {
            callback_id: query.id.clone(),
            from: TelegramId::from(query.from.id),
            action,
            origin,
        });
    }
    let message = update.message.as_ref()?;
    if let Some(photo) = message.largest_photo() {
        let from = message.from.as_ref().map(|u| u.id).unwrap_or(message.chat.id);
        return Some(BotEvent::Photo { from: TelegramId::from(from), file_id: photo.file_id.clone() });
    }
    if message.is_command("/start") {
        return Some(BotEvent::Start { chat: TelegramId::from(message.chat.id) });
    }
    None
}

route!(telegram_webhook => Post "/webhook" impl StorefrontDatabase, Notifier);
pub async fn telegram_webhook<B: StorefrontDatabase, N: Notifier>(
    req: HttpRequest,
    body: web::Json<Update>,
    secret: web::Data<WebhookSecret>,
    options: web::Data<ServerOptions>,
    api: web::Data<OrderFlowApi<B, N>>,
) -> Result<HttpResponse, ServerError> {
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    let token = req.headers().get(SECRET_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    if !secret.accepts(token) {
        warn!("🤖️ Webhook call from {peer:?} did not carry the right secret token. Rejecting it.");
        return Err(AuthError::InvalidWebhookSecret.into());
    }
    let update = body.into_inner();
    trace!("🤖️ Update {} received from {peer:?}", update.update_id);
    let Some(event) = bot_event_from_update(&update) else {
        debug!("🤖️ Update {} has nothing for the storefront. Ignoring it.", update.update_id);
        return Ok(HttpResponse::Ok().finish());
    };
    match api.handle_bot_event(event).await {
        Ok(outcome) => {
            match outcome {
                BotOutcome::Declined(reason) => debug!("🤖️ Update {} declined. {reason}", update.update_id),
                BotOutcome::Ignored => trace!("🤖️ Update {} ignored", update.update_id),
                BotOutcome::Greeted | BotOutcome::Flow(_) => trace!("🤖️ Update {} handled", update.update_id),
            }
            Ok(HttpResponse::Ok().finish())
        },
        Err(e) => {
            error!("🤖️ Could not handle update {}. Telegram will retry it. {e}", update.update_id);
            Err(e.into())
        },
    }
}
