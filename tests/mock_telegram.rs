#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use error_relay::error::TelegramError;
use error_relay::telegram::{InlineKeyboardButton, InlineKeyboardMarkup, TelegramClient};
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use tokio::time::timeout;
use url::Url;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:abc";

fn endpoint(name: &str) -> String {
    format!("/bot{TOKEN}/{name}")
}

fn client(server: &MockServer) -> TelegramClient {
    TelegramClient::new(
        Url::parse(&server.uri()).expect("valid mock url"),
        SecretString::from(TOKEN),
        Duration::from_secs(2),
        Duration::from_secs(1),
    )
    .expect("client")
}

fn sent_message() -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 501,
            "chat": {"id": 42, "type": "private"},
            "text": "hello"
        }
    })
}

#[tokio::test]
async fn send_message_payload_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(endpoint("sendMessage")))
        .and(header_exists("x-correlation-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message()))
        .expect(1)
        .mount(&server)
        .await;

    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Refresh", "refresh",
    )]]);
    let message = client(&server)
        .send_message(42, "<b>hello</b>", Some(&keyboard))
        .await
        .expect("send");
    assert_eq!(message.message_id, 501);

    let requests = server.received_requests().await.expect("requests");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    insta::assert_json_snapshot!(body, @r###"
    {
      "chat_id": 42,
      "disable_web_page_preview": true,
      "parse_mode": "HTML",
      "reply_markup": {
        "inline_keyboard": [
          [
            {
              "callback_data": "refresh",
              "text": "Refresh"
            }
          ]
        ]
      },
      "text": "<b>hello</b>"
    }
    "###);
}

#[tokio::test]
async fn rejected_request_carries_api_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(endpoint("sendMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .send_message(42, "hello", None)
        .await
        .expect_err("should fail");
    match err {
        TelegramError::HttpStatus {
            status,
            description,
        } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(description, "Bad Request: chat not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn ok_false_envelope_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .send_message(42, "hello", None)
        .await
        .expect_err("should fail");
    assert!(matches!(err, TelegramError::Api { code: 403, .. }));
}

#[tokio::test]
async fn garbage_body_is_a_json_error_with_preview() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .send_message(42, "hello", None)
        .await
        .expect_err("should fail");
    match err {
        TelegramError::Json { message } => assert!(message.contains("<html>proxy error</html>")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn single_attempt_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .send_message(42, "hello", None)
        .await
        .expect_err("should fail");
    assert!(matches!(err, TelegramError::HttpStatus { status, .. } if status == StatusCode::BAD_GATEWAY));
}

#[tokio::test]
async fn timeouts_surface_as_transport_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sent_message())
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let client = TelegramClient::new(
        Url::parse(&server.uri()).unwrap(),
        SecretString::from(TOKEN),
        Duration::from_millis(500),
        Duration::from_millis(200),
    )
    .unwrap();

    let res = timeout(Duration::from_secs(5), client.send_message(42, "hello", None)).await;
    let err = res.expect("timeout future").expect_err("should fail");
    assert!(err.is_transport());
}

#[tokio::test]
async fn unchanged_edit_counts_as_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(endpoint("editMessageText")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message is not modified: specified new message content and reply markup are exactly the same as a current content and reply markup of the message"
        })))
        .mount(&server)
        .await;

    client(&server)
        .edit_message_text(42, 501, "same text", None)
        .await
        .expect("not-modified is success");
}

#[tokio::test]
async fn get_updates_sends_offset_and_long_poll_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(endpoint("getUpdates")))
        .and(body_partial_json(json!({"offset": 7, "timeout": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                {
                    "update_id": 7,
                    "message": {
                        "message_id": 1,
                        "from": {"id": 42, "is_bot": false, "first_name": "Admin"},
                        "chat": {"id": 42, "type": "private"},
                        "text": "/start"
                    }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updates = client(&server)
        .get_updates(Some(7), Duration::from_secs(1), Duration::from_secs(1))
        .await
        .expect("updates");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].update_id, 7);
    assert_eq!(
        updates[0].message.as_ref().and_then(|m| m.text.as_deref()),
        Some("/start")
    );
}

#[tokio::test]
async fn set_webhook_passes_secret_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(endpoint("setWebhook")))
        .and(body_partial_json(json!({
            "url": "https://relay.example/webhook",
            "secret_token": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse("https://relay.example/webhook").unwrap();
    client(&server)
        .set_webhook(&url, Some(&SecretString::from("s3cret")))
        .await
        .expect("setWebhook");
}
