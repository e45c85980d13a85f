//! The administrator's Telegram panel.
//!
//! Updates reach [`AdminConsole::handle_update`] through the single update
//! worker, so panel actions are processed one at a time in arrival order.

pub mod views;
pub mod worker;

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::gateway::DeliveryGateway;
use crate::report::CanonicalErrorRecord;
use crate::state::{RelayState, StateCommand};
use crate::system;
use crate::telegram::{CallResult, CallbackQuery, Message, TelegramClient, Update};

use views::View;

/// Inline-keyboard callbacks understood by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
    Refresh,
    Stats,
    System,
    Management,
    Logs,
    TestError,
    ToggleMaintenance,
    ClearLogs,
    ResetStats,
}

impl AdminAction {
    pub const ALL: [Self; 9] = [
        Self::Refresh,
        Self::Stats,
        Self::System,
        Self::Management,
        Self::Logs,
        Self::TestError,
        Self::ToggleMaintenance,
        Self::ClearLogs,
        Self::ResetStats,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Stats => "stats",
            Self::System => "system",
            Self::Management => "management",
            Self::Logs => "logs",
            Self::TestError => "test_error",
            Self::ToggleMaintenance => "toggle_maintenance",
            Self::ClearLogs => "clear_logs",
            Self::ResetStats => "reset_stats",
        }
    }
}

impl Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown panel action '{s}'"))
    }
}

#[derive(Clone, Debug)]
pub struct AdminConsole {
    gateway: DeliveryGateway,
    admin_id: i64,
    service_name: Arc<str>,
}

impl AdminConsole {
    pub fn new(gateway: DeliveryGateway, admin_id: i64, service_name: &str) -> Self {
        Self {
            gateway,
            admin_id,
            service_name: Arc::from(service_name),
        }
    }

    fn client(&self) -> &TelegramClient {
        self.gateway.client()
    }

    fn state(&self) -> &RelayState {
        self.gateway.state()
    }

    /// Dispatch one update. Updates from anyone but the administrator are
    /// dropped without a reply.
    ///
    /// # Errors
    ///
    /// Returns the Telegram error if the reply could not be sent.
    pub async fn handle_update(&self, update: Update) -> CallResult<()> {
        let Some(sender) = update.sender() else {
            debug!(update_id = update.update_id, "update without sender ignored");
            return Ok(());
        };
        if sender.id != self.admin_id {
            warn!(
                update_id = update.update_id,
                user_id = sender.id,
                "ignoring update from unauthorized user"
            );
            return Ok(());
        }

        if let Some(query) = update.callback_query {
            self.handle_callback(query).await
        } else if let Some(message) = update.message {
            self.handle_message(message).await
        } else {
            Ok(())
        }
    }

    async fn handle_message(&self, message: Message) -> CallResult<()> {
        match message.text.as_deref().and_then(command_name) {
            Some("/start" | "/panel") => {
                let view = self.main_panel().await;
                self.client()
                    .send_message(message.chat.id, &view.text, Some(&view.keyboard))
                    .await?;
                info!("admin panel opened");
                Ok(())
            }
            other => {
                debug!(command = ?other, "message ignored");
                Ok(())
            }
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) -> CallResult<()> {
        let action = query.data.as_deref().map(str::parse::<AdminAction>);
        let (action, message) = match (action, query.message.as_ref()) {
            (Some(Ok(action)), Some(message)) => (action, message),
            (Some(Err(err)), _) => {
                warn!(error = %err, "unknown callback data");
                return self.client().answer_callback_query(&query.id, None).await;
            }
            _ => {
                debug!("callback without data or message");
                return self.client().answer_callback_query(&query.id, None).await;
            }
        };

        let (view, notice) = self.perform(action).await;

        if let Err(err) = self
            .client()
            .answer_callback_query(&query.id, notice.as_deref())
            .await
        {
            warn!(error = %err, %action, "failed to answer callback query");
        }
        self.client()
            .edit_message_text(
                message.chat.id,
                message.message_id,
                &view.text,
                Some(&view.keyboard),
            )
            .await
    }

    async fn main_panel(&self) -> View {
        let info = system::sample().await;
        views::main_panel(&self.service_name, &self.state().snapshot(), info.as_ref())
    }

    /// Run the side effect behind `action` and render the screen to show next.
    async fn perform(&self, action: AdminAction) -> (View, Option<String>) {
        debug!(%action, "panel action");
        match action {
            AdminAction::Refresh => (self.main_panel().await, None),
            AdminAction::Stats => (
                views::stats(
                    &self.state().snapshot(),
                    &self.state().recent(views::STATS_RECENT),
                ),
                None,
            ),
            AdminAction::System => {
                let info = system::sample().await;
                (views::system(info.as_ref(), &self.state().snapshot()), None)
            }
            AdminAction::Management => (views::management(&self.state().snapshot()), None),
            AdminAction::Logs => (views::logs(&self.state().recent(views::LOG_RECENT)), None),
            AdminAction::TestError => {
                let record = CanonicalErrorRecord::admin_test(Local::now());
                let delivered = match self.gateway.notify(&record).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(error = %err, "test error not delivered");
                        false
                    }
                };
                (views::test_result(delivered), None)
            }
            AdminAction::ToggleMaintenance => {
                let on = self.state().apply(StateCommand::ToggleMaintenance);
                let notice = if on {
                    "Maintenance mode enabled"
                } else {
                    "Maintenance mode disabled"
                };
                (
                    views::management(&self.state().snapshot()),
                    Some(notice.to_string()),
                )
            }
            AdminAction::ClearLogs => {
                self.state().apply(StateCommand::ClearLog);
                (
                    views::management(&self.state().snapshot()),
                    Some("Error log cleared".to_string()),
                )
            }
            AdminAction::ResetStats => {
                self.state().apply(StateCommand::ResetStats);
                (
                    views::management(&self.state().snapshot()),
                    Some("Statistics reset".to_string()),
                )
            }
        }
    }
}

/// `/start@relay_bot arg` -> `/start`
fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    Some(first.split('@').next().unwrap_or(first))
}
