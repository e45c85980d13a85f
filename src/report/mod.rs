//! Incoming error reports and their canonical, display-ready form.

pub mod agent;
pub mod device;
pub mod timestamp;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::IngestError;
use crate::types::Platform;

pub use device::{DeviceDescriptor, resolve};

pub const PHONE_NOT_SPECIFIED: &str = "not specified";
pub const DEFAULT_ERROR_TYPE: &str = "Runtime Error";

/// An error submission as posted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub user_phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub additional_data: Option<Value>,
}

impl ErrorReport {
    /// Boundary check run before any processing.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] when `platform` or `errorMessage`
    /// is missing or blank.
    pub fn validate(&self) -> Result<(), IngestError> {
        if non_blank(self.platform.as_deref()).is_none()
            || non_blank(self.error_message.as_deref()).is_none()
        {
            return Err(IngestError::validation(
                "required fields: platform, errorMessage",
            ));
        }
        Ok(())
    }
}

/// A validated report with every default filled in. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalErrorRecord {
    pub platform: Platform,
    pub user_phone: String,
    pub user_id: Option<String>,
    pub device: String,
    pub os_version: String,
    pub error_type: String,
    pub error_message: String,
    pub stack_trace: Option<String>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: String,
    pub display_time: String,
    pub additional_data: Option<Map<String, Value>>,
}

/// Normalize a validated report against the current clock.
pub fn normalize(report: ErrorReport) -> CanonicalErrorRecord {
    normalize_at(report, Local::now())
}

/// Normalize a validated report; `now` fills in a missing timestamp.
pub fn normalize_at(report: ErrorReport, now: DateTime<Local>) -> CanonicalErrorRecord {
    let user_agent = owned_non_blank(report.user_agent);
    let descriptor = resolve(user_agent.as_deref());

    let (timestamp, display_time) = match owned_non_blank(report.timestamp) {
        Some(raw) => {
            let display = timestamp::display(&raw);
            (raw, display)
        }
        None => (timestamp::iso(now), timestamp::display_now(now)),
    };

    let additional_data = match report.additional_data {
        Some(Value::Object(map)) if !map.is_empty() => Some(map),
        Some(Value::Object(_) | Value::Null) | None => None,
        Some(other) => {
            tracing::debug!(kind = value_kind(&other), "ignoring non-object additionalData");
            None
        }
    };

    CanonicalErrorRecord {
        platform: Platform::from(report.platform.unwrap_or_default()),
        user_phone: owned_non_blank(report.user_phone)
            .unwrap_or_else(|| PHONE_NOT_SPECIFIED.to_string()),
        user_id: owned_non_blank(report.user_id),
        device: descriptor.device,
        os_version: descriptor.os_version,
        error_type: owned_non_blank(report.error_type)
            .unwrap_or_else(|| DEFAULT_ERROR_TYPE.to_string()),
        error_message: report.error_message.unwrap_or_default(),
        stack_trace: owned_non_blank(report.stack_trace),
        url: owned_non_blank(report.url),
        user_agent,
        timestamp,
        display_time,
        additional_data,
    }
}

impl CanonicalErrorRecord {
    /// The synthetic record sent from the administrator panel.
    pub fn admin_test(now: DateTime<Local>) -> Self {
        let mut data = Map::new();
        data.insert("test".to_string(), json!(true));
        Self {
            platform: Platform::from("admin-panel"),
            user_phone: "ADMIN TEST".to_string(),
            user_id: None,
            device: "Admin Panel".to_string(),
            os_version: "System".to_string(),
            error_type: "Test Error".to_string(),
            error_message: "Test error triggered from the admin panel".to_string(),
            stack_trace: None,
            url: None,
            user_agent: None,
            timestamp: timestamp::iso(now),
            display_time: timestamp::display_now(now),
            additional_data: Some(data),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn owned_non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Phone numbers and Telegram user ids arrive as strings or bare numbers.
fn deserialize_opt_text<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Textish {
        Str(String),
        Int(i64),
        Float(f64),
        Null,
    }

    Ok(match Textish::deserialize(de)? {
        Textish::Str(value) => Some(value),
        Textish::Int(value) => Some(value.to_string()),
        Textish::Float(value) => Some(value.to_string()),
        Textish::Null => None,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        CanonicalErrorRecord, DEFAULT_ERROR_TYPE, ErrorReport, PHONE_NOT_SPECIFIED, normalize_at,
    };
    use crate::error::IngestError;
    use crate::types::Platform;
    use chrono::{Local, TimeZone};
    use serde_json::json;

    fn report(value: serde_json::Value) -> ErrorReport {
        match serde_json::from_value(value) {
            Ok(report) => report,
            Err(err) => panic!("invalid report fixture: {err}"),
        }
    }

    fn fixed_now() -> chrono::DateTime<Local> {
        match Local.with_ymd_and_hms(2024, 6, 1, 9, 30, 15) {
            chrono::LocalResult::Single(now) => now,
            other => panic!("ambiguous fixture time: {other:?}"),
        }
    }

    #[test]
    fn missing_optionals_receive_defaults() {
        let record = normalize_at(
            report(json!({"platform": "savolia-web", "errorMessage": "X is undefined"})),
            fixed_now(),
        );
        assert_eq!(record.platform, Platform::Website);
        assert_eq!(record.error_type, DEFAULT_ERROR_TYPE);
        assert_eq!(record.user_phone, PHONE_NOT_SPECIFIED);
        assert_eq!(record.device, "unknown");
        assert_eq!(record.os_version, "unknown");
        assert_eq!(record.display_time, "01.06.2024 09:30:15");
        assert!(record.timestamp.starts_with("2024-06-01T09:30:15"));
        assert!(record.stack_trace.is_none());
        assert!(record.additional_data.is_none());
    }

    #[test]
    fn blank_optionals_count_as_missing() {
        let record = normalize_at(
            report(json!({
                "platform": "bot.ts",
                "errorMessage": "boom",
                "errorType": "  ",
                "userPhone": "",
                "url": "",
                "additionalData": {}
            })),
            fixed_now(),
        );
        assert_eq!(record.error_type, DEFAULT_ERROR_TYPE);
        assert_eq!(record.user_phone, PHONE_NOT_SPECIFIED);
        assert!(record.url.is_none());
        assert!(record.additional_data.is_none());
    }

    #[test]
    fn numeric_identifiers_are_accepted() {
        let record = normalize_at(
            report(json!({
                "platform": "bot.ts",
                "errorMessage": "boom",
                "userId": 7_752_180_805_i64,
                "userPhone": 998_901_234_567_i64
            })),
            fixed_now(),
        );
        assert_eq!(record.user_id.as_deref(), Some("7752180805"));
        assert_eq!(record.user_phone, "998901234567");
    }

    #[test]
    fn supplied_timestamp_is_kept_raw_and_rendered() {
        let record = normalize_at(
            report(json!({
                "platform": "savolia-frontend",
                "errorMessage": "boom",
                "timestamp": "2024-01-02T03:04:05Z"
            })),
            fixed_now(),
        );
        assert_eq!(record.timestamp, "2024-01-02T03:04:05Z");
        assert_eq!(record.display_time, "02.01.2024 03:04:05");
    }

    #[test]
    fn non_object_additional_data_is_dropped() {
        let record = normalize_at(
            report(json!({
                "platform": "savolia-web",
                "errorMessage": "boom",
                "additionalData": [1, 2, 3]
            })),
            fixed_now(),
        );
        assert!(record.additional_data.is_none());
    }

    #[test]
    fn validation_requires_platform_and_message() {
        let missing_message = report(json!({"platform": "savolia-web"}));
        assert!(matches!(
            missing_message.validate(),
            Err(IngestError::Validation(_))
        ));

        let blank_platform = report(json!({"platform": " ", "errorMessage": "boom"}));
        assert!(blank_platform.validate().is_err());

        let ok = report(json!({"platform": "anything", "errorMessage": "boom"}));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn admin_test_record_is_unknown_platform() {
        let record = CanonicalErrorRecord::admin_test(fixed_now());
        assert!(!record.platform.is_known());
        assert_eq!(record.error_type, "Test Error");
        assert_eq!(record.display_time, "01.06.2024 09:30:15");
    }
}
