use std::collections::BTreeMap;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use chrono::Local;
use serde::Serialize;

use crate::report::timestamp;
use crate::system::{self, SystemInfo, SystemSummary};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub service: String,
    pub uptime: String,
    pub errors_processed: u64,
    pub maintenance_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemSummary>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub error_count: u64,
    pub platform_stats: BTreeMap<String, u64>,
    pub recent_errors_count: usize,
    pub maintenance_mode: bool,
    pub uptime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_stats: Option<SystemInfo>,
}

/// `GET /health`
pub async fn health(State(app): State<AppState>) -> Json<HealthResponse> {
    let snapshot = app.relay().snapshot();
    let system = system::sample().await;
    Json(HealthResponse {
        status: "OK",
        timestamp: timestamp::iso(Local::now()),
        service: app.service_name.to_string(),
        uptime: format_uptime(snapshot.uptime),
        errors_processed: snapshot.error_count,
        maintenance_mode: snapshot.maintenance_mode,
        system: system.as_ref().map(SystemInfo::summary),
    })
}

/// `GET /api/stats`
pub async fn stats(State(app): State<AppState>) -> Json<StatsResponse> {
    let snapshot = app.relay().snapshot();
    let system_stats = system::sample().await;
    Json(StatsResponse {
        error_count: snapshot.error_count,
        platform_stats: snapshot.platform_stats,
        recent_errors_count: snapshot.recent_errors_count,
        maintenance_mode: snapshot.maintenance_mode,
        uptime: format_uptime(snapshot.uptime),
        system_stats,
    })
}

/// Rendered in whole seconds.
pub fn format_uptime(uptime: Duration) -> String {
    humantime::format_duration(Duration::from_secs(uptime.as_secs())).to_string()
}
