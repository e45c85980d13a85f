//! Delivery of rendered notifications to the administrator chat.

use chrono::Local;
use tracing::{error, info};

use crate::error::DeliveryError;
use crate::format;
use crate::report::CanonicalErrorRecord;
use crate::state::{ErrorSummary, RelayState};
use crate::telegram::TelegramClient;

#[derive(Clone, Debug)]
pub struct DeliveryGateway {
    client: TelegramClient,
    admin_chat: i64,
    state: RelayState,
    dry_run: bool,
}

impl DeliveryGateway {
    pub const fn new(
        client: TelegramClient,
        admin_chat: i64,
        state: RelayState,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            admin_chat,
            state,
            dry_run,
        }
    }

    pub const fn client(&self) -> &TelegramClient {
        &self.client
    }

    pub const fn state(&self) -> &RelayState {
        &self.state
    }

    /// Send `message` to the administrator and account for `record` once the
    /// platform has accepted it. A failed send leaves the counters untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] on transport failure, timeout, a non-2xx
    /// status or an `ok: false` API answer.
    pub async fn deliver(
        &self,
        record: &CanonicalErrorRecord,
        message: &str,
    ) -> Result<(), DeliveryError> {
        if self.dry_run {
            info!(
                platform = %record.platform,
                error_type = %record.error_type,
                chars = message.chars().count(),
                "dry-run: would send notification\n{message}"
            );
        } else if let Err(err) = self
            .client
            .send_message(self.admin_chat, message, None)
            .await
        {
            error!(
                platform = %record.platform,
                error_type = %record.error_type,
                transport = err.is_transport(),
                error = %err,
                "notification delivery failed"
            );
            return Err(DeliveryError::from(err));
        }

        self.state.record_delivery(ErrorSummary::of(record, Local::now()));
        info!(
            platform = %record.platform,
            error_type = %record.error_type,
            "notification delivered"
        );
        Ok(())
    }

    /// Format and deliver in one step.
    ///
    /// # Errors
    ///
    /// See [`DeliveryGateway::deliver`].
    pub async fn notify(&self, record: &CanonicalErrorRecord) -> Result<(), DeliveryError> {
        let message = format::notification(record);
        self.deliver(record, &message).await
    }
}
