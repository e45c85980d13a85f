use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use lru::LruCache;
use secrecy::SecretString;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::telegram::{TelegramClient, Update};

use super::AdminConsole;

const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

/// What the worker did before its queue closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub handled: u64,
    pub duplicates: u64,
    pub failed: u64,
}

/// Drain the update queue until every sender is gone or the queue is closed.
///
/// Telegram may deliver the same update twice (webhook redelivery, a poll
/// racing a restart); ids already seen are skipped.
pub async fn run_update_worker(
    rx: Receiver<Update>,
    console: AdminConsole,
    dedup_capacity: NonZeroUsize,
) -> WorkerSummary {
    let mut seen: LruCache<i64, ()> = LruCache::new(dedup_capacity);
    let mut summary = WorkerSummary::default();

    while let Ok(update) = rx.recv().await {
        let update_id = update.update_id;
        if seen.put(update_id, ()).is_some() {
            debug!(update_id, "duplicate update skipped");
            summary.duplicates += 1;
            continue;
        }
        match console.handle_update(update).await {
            Ok(()) => summary.handled += 1,
            Err(err) => {
                warn!(update_id, error = %err, "failed to handle update");
                summary.failed += 1;
            }
        }
    }

    info!(
        handled = summary.handled,
        duplicates = summary.duplicates,
        failed = summary.failed,
        "update worker stopped"
    );
    summary
}

/// Long-poll `getUpdates` and feed the queue until `shutdown` resolves or the
/// queue closes. A full queue holds the poller back; the offset only moves
/// past updates that were actually queued.
pub async fn poll_updates<F>(
    client: TelegramClient,
    queue: Sender<Update>,
    poll_timeout: Duration,
    request_timeout: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut offset: Option<i64> = None;
    info!(poll_timeout_s = poll_timeout.as_secs(), "polling for updates");

    'poll: loop {
        let batch = tokio::select! {
            biased;
            () = &mut shutdown => break,
            res = client.get_updates(offset, poll_timeout, request_timeout) => res,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    let update_id = update.update_id;
                    let queued = tokio::select! {
                        biased;
                        () = &mut shutdown => break 'poll,
                        res = queue.send(update) => res,
                    };
                    if queued.is_err() {
                        info!("update queue closed, polling stopped");
                        return;
                    }
                    offset = Some(update_id + 1);
                }
            }
            Err(err) => {
                warn!(error = %err, "getUpdates failed");
                tokio::select! {
                    biased;
                    () = &mut shutdown => break,
                    () = sleep(POLL_ERROR_PAUSE) => {}
                }
            }
        }
    }
    info!("update polling stopped");
}

/// Register the webhook with Telegram. Failure is logged and reported as
/// `false`; the HTTP surface keeps running either way.
pub async fn register_webhook(
    client: &TelegramClient,
    url: Option<&Url>,
    secret: Option<&SecretString>,
) -> bool {
    let Some(url) = url else {
        info!("no webhook_url configured, expecting an externally registered webhook");
        return false;
    };
    match client.set_webhook(url, secret).await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, %url, "setWebhook failed, continuing");
            false
        }
    }
}
