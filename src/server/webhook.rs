use async_channel::TrySendError;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, warn};

use crate::telegram::Update;

use super::WebhookIntake;

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// `POST /webhook`
///
/// Anything other than a secret mismatch is answered with 200 so Telegram
/// does not redeliver; processing happens on the update worker.
pub async fn receive(
    State(intake): State<WebhookIntake>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    if let Some(expected) = intake.secret.as_ref() {
        let observed = headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .map_or("", str::trim);
        if observed != expected.expose_secret() {
            warn!("webhook secret mismatch");
            return (StatusCode::UNAUTHORIZED, Json(json!({"status": "unauthorized"})));
        }
    }

    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(err) => {
            warn!(error = %err, "ignoring malformed webhook payload");
            return (StatusCode::OK, Json(json!({"status": "ignored"})));
        }
    };

    let update_id = update.update_id;
    match intake.queue.try_send(update) {
        Ok(()) => {
            debug!(update_id, "update queued");
            (StatusCode::OK, Json(json!({"status": "ok"})))
        }
        Err(TrySendError::Full(_)) => {
            warn!(update_id, "update queue full, dropping update");
            (StatusCode::OK, Json(json!({"status": "dropped"})))
        }
        Err(TrySendError::Closed(_)) => {
            warn!(update_id, "update queue closed, dropping update");
            (StatusCode::OK, Json(json!({"status": "dropped"})))
        }
    }
}
