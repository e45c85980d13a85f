use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::TelegramError;

use super::TelegramClient;
use super::client::CallResult;
use super::models::{
    AnswerCallbackQuery, DeleteWebhook, EditMessageText, GetUpdates, InlineKeyboardMarkup,
    Message, SendMessage, SetWebhook, Update, User,
};

const PARSE_MODE: &str = "HTML";
const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

impl TelegramClient {
    pub async fn get_me(&self) -> CallResult<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> CallResult<Message> {
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_web_page_preview: true,
            reply_markup,
        };
        self.call("sendMessage", &payload, None).await
    }

    /// Replace the text and keyboard of a message the bot sent earlier.
    ///
    /// Telegram rejects edits that change nothing; those count as success.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> CallResult<()> {
        let payload = EditMessageText {
            chat_id,
            message_id,
            text,
            parse_mode: PARSE_MODE,
            reply_markup,
        };
        match self.call::<_, Value>("editMessageText", &payload, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_not_modified(&err) => {
                debug!(message_id, "message already up to date");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> CallResult<()> {
        let payload = AnswerCallbackQuery {
            callback_query_id,
            text,
        };
        let _: bool = self.call("answerCallbackQuery", &payload, None).await?;
        Ok(())
    }

    /// Long-poll for updates. The request deadline is stretched by
    /// `poll_timeout` so the server can hold the connection open.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
        request_timeout: Duration,
    ) -> CallResult<Vec<Update>> {
        let payload = GetUpdates {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call(
            "getUpdates",
            &payload,
            Some(poll_timeout + request_timeout),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &Url, secret: Option<&SecretString>) -> CallResult<()> {
        let payload = SetWebhook {
            url: url.as_str(),
            secret_token: secret.map(ExposeSecret::expose_secret),
            allowed_updates: ALLOWED_UPDATES,
        };
        let _: bool = self.call("setWebhook", &payload, None).await?;
        info!(%url, "webhook registered");
        Ok(())
    }

    pub async fn delete_webhook(&self) -> CallResult<()> {
        let payload = DeleteWebhook {
            drop_pending_updates: false,
        };
        let _: bool = self.call("deleteWebhook", &payload, None).await?;
        debug!("webhook removed");
        Ok(())
    }
}

fn is_not_modified(err: &TelegramError) -> bool {
    match err {
        TelegramError::HttpStatus { description, .. } | TelegramError::Api { description, .. } => {
            description.contains("message is not modified")
        }
        _ => false,
    }
}
