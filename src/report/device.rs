use serde::Serialize;
use tracing::debug;

use super::agent;

pub const UNKNOWN: &str = "unknown";

/// Best-effort description of the reporting client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub device: String,
    pub os_version: String,
}

impl DeviceDescriptor {
    pub fn unknown() -> Self {
        Self {
            device: UNKNOWN.to_string(),
            os_version: UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.device == UNKNOWN && self.os_version == UNKNOWN
    }
}

/// Resolve a user-agent string into a device label and an OS label.
///
/// Never fails: anything the grammar cannot make sense of degrades to
/// [`UNKNOWN`].
pub fn resolve(user_agent: Option<&str>) -> DeviceDescriptor {
    let Some(raw) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return DeviceDescriptor::unknown();
    };

    let parsed = agent::parse(raw);

    let device = match (parsed.device_brand.as_deref(), parsed.device_model.as_deref()) {
        (Some(brand), Some(model)) if model.starts_with(brand) => model.to_string(),
        (Some(brand), Some(model)) => format!("{brand} {model}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => parsed
            .browser_family
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string()),
    };

    let os_version = match (parsed.os_family.as_deref(), parsed.os_version.as_deref()) {
        (Some(family), Some(version)) => format!("{family} {version}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => UNKNOWN.to_string(),
    };

    let descriptor = DeviceDescriptor { device, os_version };
    if descriptor.is_unknown() {
        debug!(user_agent = raw, "user agent not recognized");
    }
    descriptor
}
