//! HTTP surface: error ingestion, status endpoints and the Telegram webhook.

pub mod ingest;
pub mod status;
pub mod webhook;

use std::future::Future;
use std::sync::Arc;

use async_channel::Sender;
use axum::Router;
use axum::routing::{get, post};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::Result;
use crate::error::Error;
use crate::gateway::DeliveryGateway;
use crate::state::RelayState;
use crate::telegram::Update;

/// Shared handler state. Cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    gateway: DeliveryGateway,
    service_name: Arc<str>,
    webhook: Option<WebhookIntake>,
}

/// Where webhook deliveries go and how they are authenticated.
#[derive(Clone, Debug)]
pub struct WebhookIntake {
    pub queue: Sender<Update>,
    pub secret: Option<SecretString>,
}

impl AppState {
    pub fn new(gateway: DeliveryGateway, service_name: &str) -> Self {
        Self {
            gateway,
            service_name: Arc::from(service_name),
            webhook: None,
        }
    }

    #[must_use]
    pub fn with_webhook(mut self, intake: WebhookIntake) -> Self {
        self.webhook = Some(intake);
        self
    }

    pub const fn relay(&self) -> &RelayState {
        self.gateway.state()
    }
}

pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/api/log-error", post(ingest::log_error))
        .route("/health", get(status::health))
        .route("/api/stats", get(status::stats));
    if let Some(intake) = state.webhook.clone() {
        router = router.merge(
            Router::new()
                .route("/webhook", post(webhook::receive))
                .with_state::<AppState>(intake),
        );
    }
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`Error::Server`] if the listener fails.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, webhook = state.webhook.is_some(), "http server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::Server)
}
