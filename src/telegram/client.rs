use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::TelegramError;

use super::api::{ApiEnvelope, body_preview};

const CORRELATION_HEADER: &str = "x-correlation-id";

pub type CallResult<T> = std::result::Result<T, TelegramError>;

/// Thin Bot API client. One attempt per call; failures are reported, never retried.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Build a client for the Bot API rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Client`] if the HTTP client fails to build.
    pub fn new(
        mut base: Url,
        token: SecretString,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, TelegramError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .user_agent(concat!("error-relay/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| TelegramError::Client { source })?;

        Ok(Self { http, base, token })
    }

    fn method_url(&self, method: &str) -> CallResult<Url> {
        // `./` stops the colon in the token from parsing as a URL scheme.
        let path = format!("./bot{}/{method}", self.token.expose_secret());
        self.base.join(&path).map_err(|err| TelegramError::Json {
            message: format!("cannot build URL for {method}: {err}"),
        })
    }

    /// Invoke one Bot API method. `timeout` overrides the client-wide request
    /// timeout, which long polling needs.
    pub(super) async fn call<P, T>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> CallResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let correlation_id = Uuid::now_v7().to_string();
        let started = Instant::now();

        let mut request = self
            .http
            .post(self.method_url(method)?)
            .header(CORRELATION_HEADER, &correlation_id)
            .json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let description = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.description)
                .unwrap_or_else(|| body_preview(&body));
            debug!(method, %correlation_id, %status, %description, "telegram call rejected");
            return Err(TelegramError::HttpStatus {
                status,
                description,
            });
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_slice(&body).map_err(|err| TelegramError::Json {
                message: format!(
                    "error decoding response body: {err}; body preview: {}",
                    body_preview(&body)
                ),
            })?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        let result = envelope
            .result
            .ok_or(TelegramError::MissingField { field: "result" })?;
        debug!(
            method,
            %correlation_id,
            latency_ms = started.elapsed().as_millis(),
            "telegram call succeeded"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::TelegramClient;
    use secrecy::SecretString;
    use std::time::Duration;
    use url::Url;

    fn client(base: &str) -> TelegramClient {
        let base = match Url::parse(base) {
            Ok(url) => url,
            Err(err) => panic!("bad fixture url: {err}"),
        };
        match TelegramClient::new(
            base,
            SecretString::from("123:abc"),
            Duration::from_secs(1),
            Duration::from_secs(1),
        ) {
            Ok(client) => client,
            Err(err) => panic!("client build failed: {err}"),
        }
    }

    #[test]
    fn method_url_keeps_base_path() {
        let client = client("http://127.0.0.1:9/proxy");
        let url = match client.method_url("sendMessage") {
            Ok(url) => url,
            Err(err) => panic!("url build failed: {err}"),
        };
        assert_eq!(url.as_str(), "http://127.0.0.1:9/proxy/bot123:abc/sendMessage");
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", client("https://api.telegram.org"));
        assert!(!rendered.contains("123:abc"));
    }
}
