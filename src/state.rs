//! Process-wide counters, the recent-errors log and the maintenance flag.
//!
//! Everything lives behind one mutex so that recording a delivery (counter
//! increments plus the log append) is a single atomic step.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::info;

use crate::report::CanonicalErrorRecord;
use crate::types::Platform;

pub const RECENT_ERRORS_CAPACITY: usize = 50;

/// Lightweight trace of one delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSummary {
    pub recorded_at: DateTime<Local>,
    pub platform: Platform,
    pub error_type: String,
    pub user_phone: String,
}

impl ErrorSummary {
    pub fn of(record: &CanonicalErrorRecord, recorded_at: DateTime<Local>) -> Self {
        Self {
            recorded_at,
            platform: record.platform.clone(),
            error_type: record.error_type.clone(),
            user_phone: record.user_phone.clone(),
        }
    }
}

/// Administrative mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCommand {
    ToggleMaintenance,
    SetMaintenance(bool),
    ClearLog,
    ResetStats,
}

/// Point-in-time copy of the counters for status endpoints and views.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub error_count: u64,
    pub platform_stats: BTreeMap<String, u64>,
    pub recent_errors_count: usize,
    pub maintenance_mode: bool,
    pub uptime: Duration,
}

#[derive(Debug)]
struct Inner {
    error_count: u64,
    platform_stats: BTreeMap<String, u64>,
    recent: VecDeque<ErrorSummary>,
    maintenance: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            error_count: 0,
            platform_stats: zeroed_platform_stats(),
            recent: VecDeque::with_capacity(RECENT_ERRORS_CAPACITY),
            maintenance: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelayState {
    inner: Arc<Mutex<Inner>>,
    started: Instant,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves `Inner` consistent, so poisoning is ignored.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn maintenance(&self) -> bool {
        self.lock().maintenance
    }

    /// Account for one confirmed delivery.
    pub fn record_delivery(&self, summary: ErrorSummary) {
        let mut inner = self.lock();
        inner.error_count += 1;
        if summary.platform.is_known() {
            *inner
                .platform_stats
                .entry(summary.platform.as_str().to_string())
                .or_insert(0) += 1;
        }
        if inner.recent.len() == RECENT_ERRORS_CAPACITY {
            inner.recent.pop_front();
        }
        inner.recent.push_back(summary);
    }

    /// Apply an administrative command and return the resulting maintenance flag.
    pub fn apply(&self, command: StateCommand) -> bool {
        let mut inner = self.lock();
        match command {
            StateCommand::ToggleMaintenance => inner.maintenance = !inner.maintenance,
            StateCommand::SetMaintenance(on) => inner.maintenance = on,
            StateCommand::ClearLog => inner.recent.clear(),
            StateCommand::ResetStats => {
                inner.error_count = 0;
                inner.platform_stats = zeroed_platform_stats();
            }
        }
        let maintenance = inner.maintenance;
        drop(inner);
        info!(?command, maintenance, "state command applied");
        maintenance
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.lock();
        StatsSnapshot {
            error_count: inner.error_count,
            platform_stats: inner.platform_stats.clone(),
            recent_errors_count: inner.recent.len(),
            maintenance_mode: inner.maintenance,
            uptime: self.uptime(),
        }
    }

    /// The newest `limit` summaries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ErrorSummary> {
        let inner = self.lock();
        let skip = inner.recent.len().saturating_sub(limit);
        inner.recent.iter().skip(skip).cloned().collect()
    }
}

fn zeroed_platform_stats() -> BTreeMap<String, u64> {
    Platform::KNOWN
        .iter()
        .map(|platform| (platform.as_str().to_string(), 0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ErrorSummary, RECENT_ERRORS_CAPACITY, RelayState, StateCommand};
    use crate::types::Platform;
    use chrono::Local;

    fn summary(platform: &str, error_type: &str) -> ErrorSummary {
        ErrorSummary {
            recorded_at: Local::now(),
            platform: Platform::from(platform),
            error_type: error_type.to_string(),
            user_phone: "not specified".to_string(),
        }
    }

    #[test]
    fn starts_with_zeroed_known_platforms() {
        let snapshot = RelayState::new().snapshot();
        assert_eq!(snapshot.error_count, 0);
        assert_eq!(snapshot.platform_stats.len(), 3);
        assert!(snapshot.platform_stats.values().all(|count| *count == 0));
        assert!(!snapshot.maintenance_mode);
    }

    #[test]
    fn unknown_platforms_only_count_in_total() {
        let state = RelayState::new();
        state.record_delivery(summary("savolia-web", "TypeError"));
        state.record_delivery(summary("admin-panel", "Test Error"));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.error_count, 2);
        assert_eq!(snapshot.platform_stats.get("savolia-web"), Some(&1));
        assert!(!snapshot.platform_stats.contains_key("admin-panel"));
        assert_eq!(snapshot.recent_errors_count, 2);
    }

    #[test]
    fn log_keeps_the_fifty_most_recent() {
        let state = RelayState::new();
        for i in 0..60 {
            state.record_delivery(summary("bot.ts", &format!("E{i}")));
        }

        let recent = state.recent(usize::MAX);
        assert_eq!(recent.len(), RECENT_ERRORS_CAPACITY);
        assert_eq!(recent[0].error_type, "E10");
        assert_eq!(recent[RECENT_ERRORS_CAPACITY - 1].error_type, "E59");
        assert_eq!(state.snapshot().error_count, 60);
    }

    #[test]
    fn recent_returns_newest_tail() {
        let state = RelayState::new();
        for i in 0..7 {
            state.record_delivery(summary("bot.ts", &format!("E{i}")));
        }
        let tail: Vec<String> = state
            .recent(3)
            .into_iter()
            .map(|entry| entry.error_type)
            .collect();
        assert_eq!(tail, ["E4", "E5", "E6"]);
    }

    #[test]
    fn commands_mutate_flag_log_and_counters() {
        let state = RelayState::new();
        state.record_delivery(summary("savolia-frontend", "E"));

        assert!(state.apply(StateCommand::ToggleMaintenance));
        assert!(state.maintenance());
        assert!(!state.apply(StateCommand::ToggleMaintenance));
        assert!(state.apply(StateCommand::SetMaintenance(true)));

        state.apply(StateCommand::ClearLog);
        assert_eq!(state.snapshot().recent_errors_count, 0);
        assert_eq!(state.snapshot().error_count, 1);

        state.apply(StateCommand::ResetStats);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.error_count, 0);
        assert_eq!(snapshot.platform_stats.get("savolia-frontend"), Some(&0));
    }
}
