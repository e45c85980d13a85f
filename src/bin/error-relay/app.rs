use std::num::NonZeroUsize;
use std::path::PathBuf;

use async_channel::bounded;
use error_relay::Result;
use error_relay::admin::AdminConsole;
use error_relay::admin::worker::{poll_updates, register_webhook, run_update_worker};
use error_relay::config::Config;
use error_relay::error::Error as RelayError;
use error_relay::gateway::DeliveryGateway;
use error_relay::server::{self, AppState, WebhookIntake};
use error_relay::state::RelayState;
use error_relay::telegram::TelegramClient;
use error_relay::telemetry::init_tracing;
use error_relay::types::UpdateMode;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use super::cli::Cli;

const DEFAULT_CONFIG: &str = "config.toml";

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(mode) = cli.updates {
        config.telegram.updates = mode;
    }

    let client = TelegramClient::new(
        config.telegram.api_base.clone(),
        config.telegram.token.clone(),
        config.telegram.request_timeout,
        config.telegram.connect_timeout,
    )?;

    if cli.dry_run {
        info!("dry-run: notifications are logged, not sent");
    } else {
        match client.get_me().await {
            Ok(me) => info!(
                bot = me.username.as_deref().unwrap_or(&me.first_name),
                "telegram credentials verified"
            ),
            Err(err) => warn!(error = %err, "getMe failed, continuing"),
        }
    }

    let relay = RelayState::new();
    let gateway = DeliveryGateway::new(
        client.clone(),
        config.telegram.admin_id,
        relay,
        cli.dry_run,
    );
    let console = AdminConsole::new(
        gateway.clone(),
        config.telegram.admin_id,
        &config.server.service_name,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (tx, rx) = bounded(config.app.update_queue_bound);
    let dedup = NonZeroUsize::new(config.app.dedup_cache_size).unwrap_or(NonZeroUsize::MIN);
    let worker = tokio::spawn(run_update_worker(rx, console, dedup));

    let mut app_state = AppState::new(gateway, &config.server.service_name);
    let mut poller = None;
    match config.telegram.updates {
        UpdateMode::Polling => {
            if let Err(err) = client.delete_webhook().await {
                warn!(error = %err, "deleteWebhook failed, polling may be refused");
            }
            poller = Some(tokio::spawn(poll_updates(
                client.clone(),
                tx.clone(),
                config.telegram.poll_timeout,
                config.telegram.request_timeout,
                wait_for(shutdown_rx.clone()),
            )));
        }
        UpdateMode::Webhook => {
            register_webhook(
                &client,
                config.telegram.webhook_url.as_ref(),
                config.telegram.webhook_secret.as_ref(),
            )
            .await;
            app_state = app_state.with_webhook(WebhookIntake {
                queue: tx.clone(),
                secret: config.telegram.webhook_secret.clone(),
            });
        }
        UpdateMode::Disabled => info!("admin panel disabled"),
    }

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr).await.map_err(RelayError::Server)?;
    info!(
        %addr,
        service = %config.server.service_name,
        updates = %config.telegram.updates,
        "error relay starting"
    );

    let served = server::serve(listener, app_state, async move {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    })
    .await;

    if let Some(poller) = poller {
        if let Err(err) = poller.await {
            warn!(error = %err, "update poller terminated unexpectedly");
        }
    }
    tx.close();
    if let Err(err) = worker.await {
        warn!(error = %err, "update worker terminated unexpectedly");
    }

    served
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
