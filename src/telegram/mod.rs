pub(crate) mod api;
pub(crate) mod client;
pub(crate) mod models;
pub(crate) mod ops;

pub use client::{CallResult, TelegramClient};
pub use models::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update, User,
};
