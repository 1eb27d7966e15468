use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
    Mutex,
};

use crate::{
    db_types::TelegramId,
    traits::{Button, Notifier, NotifierError},
};

/// Everything a [`RecordingNotifier`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message { chat: TelegramId, text: String, buttons: Vec<Button> },
    Photo { chat: TelegramId, photo: String, caption: String, buttons: Vec<Button> },
    CaptionEdit { chat: TelegramId, message_id: i64, caption: String },
    CallbackAnswer { callback_id: String, text: Option<String>, show_alert: bool },
}

impl Sent {
    pub fn chat(&self) -> Option<TelegramId> {
        match self {
            Sent::Message { chat, .. } | Sent::Photo { chat, .. } | Sent::CaptionEdit { chat, .. } => Some(*chat),
            Sent::CallbackAnswer { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Message { text, .. } => Some(text),
            Sent::Photo { caption, .. } | Sent::CaptionEdit { caption, .. } => Some(caption),
            Sent::CallbackAnswer { text, .. } => text.as_deref(),
        }
    }
}

/// A [`Notifier`] that records every call. It can be switched to fail every message delivery, to simulate an
/// unreachable messaging service. Failed deliveries are not recorded; callback answers always succeed.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Sent>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, chat: TelegramId) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.chat() == Some(chat)).collect()
    }

    pub fn callback_answers(&self) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| matches!(s, Sent::CallbackAnswer { .. })).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut s) = self.sent.lock() {
            s.clear();
        }
    }

    fn record(&self, chat: TelegramId, item: Sent) -> Result<(), NotifierError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifierError::DeliveryFailed { chat, reason: "simulated outage".into() });
        }
        self.push(item);
        Ok(())
    }

    fn push(&self, item: Sent) {
        if let Ok(mut s) = self.sent.lock() {
            s.push(item);
        }
    }
}

impl Notifier for RecordingNotifier {
    async fn send_message(&self, chat: TelegramId, text: &str, buttons: &[Button]) -> Result<(), NotifierError> {
        self.record(chat, Sent::Message { chat, text: text.to_string(), buttons: buttons.to_vec() })
    }

    async fn send_photo(
        &self,
        chat: TelegramId,
        photo: &str,
        caption: &str,
        buttons: &[Button],
    ) -> Result<(), NotifierError> {
        let item =
            Sent::Photo { chat, photo: photo.to_string(), caption: caption.to_string(), buttons: buttons.to_vec() };
        self.record(chat, item)
    }

    async fn edit_caption(&self, chat: TelegramId, message_id: i64, caption: &str) -> Result<(), NotifierError> {
        self.record(chat, Sent::CaptionEdit { chat, message_id, caption: caption.to_string() })
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), NotifierError> {
        self.push(Sent::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(String::from),
            show_alert,
        });
        Ok(())
    }
}
