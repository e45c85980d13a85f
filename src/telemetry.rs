use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

const DEFAULT_FILTER: &str = "info,tower_http=warn";

/// Install the global tracing subscriber.
///
/// The filter is taken from `explicit_filter`, then `RUST_LOG`, then a quiet
/// default; the first candidate that parses wins.
///
/// # Errors
///
/// Returns an error when no filter candidate is valid, when JSON output is
/// requested without the `json-logs` feature, or when a global subscriber is
/// already installed.
pub fn init_tracing(explicit_filter: Option<&str>, use_json: bool) -> Result<()> {
    let filter = pick_filter(explicit_filter, std::env::var("RUST_LOG").ok())?;

    #[cfg(feature = "json-logs")]
    if use_json {
        let subscriber = Registry::default().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        );
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| Error::Telemetry(err.to_string()))?;
        return Ok(());
    }

    #[cfg(not(feature = "json-logs"))]
    if use_json {
        return Err(Error::Telemetry(
            "binary was built without the `json-logs` feature".to_string(),
        ));
    }

    let subscriber = Registry::default().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| Error::Telemetry(err.to_string()))
}

fn pick_filter(explicit: Option<&str>, from_env: Option<String>) -> Result<EnvFilter> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(from_env)
        .chain(std::iter::once(DEFAULT_FILTER.to_string()))
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))
}

#[cfg(test)]
mod tests {
    use super::pick_filter;

    #[test]
    fn falls_back_when_explicit_filter_is_invalid() {
        let filter = match pick_filter(Some("error_relay=notalevel"), None) {
            Ok(filter) => filter,
            Err(err) => panic!("fallback filter rejected: {err}"),
        };
        assert!(filter.to_string().contains("info"));
    }

    #[test]
    fn explicit_filter_wins_over_environment() {
        let filter = match pick_filter(Some("error_relay=debug"), Some("warn".to_string())) {
            Ok(filter) => filter,
            Err(err) => panic!("explicit filter rejected: {err}"),
        };
        assert_eq!(filter.to_string(), "error_relay=debug");
    }
}
