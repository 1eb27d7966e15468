mod api;
mod config;
mod error;

mod data_objects;

pub use api::TelegramApi;
pub use config::TelegramConfig;
pub use data_objects::{
    ApiResponse,
    CallbackQuery,
    Chat,
    InlineKeyboardButton,
    InlineKeyboardMarkup,
    Message,
    PhotoSize,
    Update,
    User,
    WebAppInfo,
};
pub use error::TelegramApiError;
