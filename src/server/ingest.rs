use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::IngestError;
use crate::report::{self, ErrorReport};

use super::AppState;

/// `POST /api/log-error`
pub async fn log_error(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, IngestError> {
    let report = parse_report(&body)?;

    if app.relay().maintenance() {
        info!("report rejected: maintenance mode");
        return Err(IngestError::Unavailable);
    }

    report.validate()?;
    let record = report::normalize(report);
    app.gateway.notify(&record).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Error registered",
    })))
}

fn parse_report(body: &[u8]) -> Result<ErrorReport, IngestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestError::validation("request body is empty"));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| IngestError::validation(format!("invalid JSON: {err}")))?;
    if !value.is_object() {
        return Err(IngestError::validation("request body must be a JSON object"));
    }
    serde_json::from_value(value)
        .map_err(|err| IngestError::validation(format!("invalid report: {err}")))
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Self::Delivery(err) => {
                warn!(error = %err, "report accepted but not delivered");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to deliver notification".to_string(),
                )
            }
        };
        (status, Json(json!({"success": false, "error": message}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_report;
    use crate::error::IngestError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn empty_and_malformed_bodies_are_validation_errors() {
        for body in [&b""[..], b"   ", b"{not json", b"[1,2]", b"\"text\""] {
            assert!(
                matches!(parse_report(body), Err(IngestError::Validation(_))),
                "body {:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn wrongly_typed_fields_are_rejected() {
        assert!(parse_report(br#"{"platform": {"nested": true}}"#).is_err());
    }

    #[test]
    fn object_bodies_parse() {
        let report = match parse_report(br#"{"platform": "bot.ts", "errorMessage": "x"}"#) {
            Ok(report) => report,
            Err(err) => panic!("valid body rejected: {err}"),
        };
        assert_eq!(report.platform.as_deref(), Some("bot.ts"));
    }

    #[test]
    fn error_classes_map_to_statuses() {
        assert_eq!(
            IngestError::validation("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            IngestError::Unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
