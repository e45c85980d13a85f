//! Host resource sampling for the status endpoints and the admin panel.

use std::path::Path;

use serde::Serialize;
use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, System};
use tracing::warn;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemInfo {
    pub cpu: CpuUsage,
    pub memory: SpaceUsage,
    /// The root filesystem, or the largest disk when `/` is not listed.
    pub disk: Option<SpaceUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuUsage {
    pub percent: f64,
    pub count: usize,
}

/// Sizes in GiB, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpaceUsage {
    pub total: f64,
    pub used: f64,
    pub percent: f64,
}

/// Percentages only, as `/health` reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemSummary {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: Option<f64>,
}

impl SystemInfo {
    pub fn summary(&self) -> SystemSummary {
        SystemSummary {
            cpu_percent: self.cpu.percent,
            memory_percent: self.memory.percent,
            disk_percent: self.disk.map(|disk| disk.percent),
        }
    }
}

impl SpaceUsage {
    #[allow(clippy::cast_precision_loss)]
    fn from_bytes(total: u64, used: u64) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            round_to(used as f64 / total as f64 * 100.0, 1)
        };
        Self {
            total: round_to(total as f64 / GIB, 2),
            used: round_to(used as f64 / GIB, 2),
            percent,
        }
    }
}

/// Take one sample off the async runtime. CPU usage needs two readings a
/// short interval apart, so this takes a fraction of a second.
pub async fn sample() -> Option<SystemInfo> {
    match tokio::task::spawn_blocking(sample_blocking).await {
        Ok(info) => Some(info),
        Err(err) => {
            warn!(error = %err, "system sampling failed");
            None
        }
    }
}

fn sample_blocking() -> SystemInfo {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let disks = Disks::new_with_refreshed_list();
    let disk = pick_disk(disks.list().iter().map(|disk| {
        (
            disk.mount_point(),
            disk.total_space(),
            disk.available_space(),
        )
    }));

    SystemInfo {
        cpu: CpuUsage {
            percent: round_to(f64::from(sys.global_cpu_usage()), 1),
            count: sys.cpus().len(),
        },
        memory: SpaceUsage::from_bytes(sys.total_memory(), sys.used_memory()),
        disk,
    }
}

/// `(mount point, total bytes, available bytes)` -> usage of `/`, falling
/// back to the largest disk.
fn pick_disk<'a>(disks: impl Iterator<Item = (&'a Path, u64, u64)>) -> Option<SpaceUsage> {
    let mut largest: Option<(u64, u64)> = None;
    for (mount, total, available) in disks {
        if mount == Path::new("/") {
            return Some(SpaceUsage::from_bytes(total, total.saturating_sub(available)));
        }
        if largest.is_none_or(|(best, _)| total > best) {
            largest = Some((total, available));
        }
    }
    largest.map(|(total, available)| SpaceUsage::from_bytes(total, total.saturating_sub(available)))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::{GIB, SpaceUsage, pick_disk, sample};
    use std::path::Path;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn gib(amount: f64) -> u64 {
        (amount * GIB) as u64
    }

    #[test]
    fn usage_is_reported_in_rounded_gib() {
        let usage = SpaceUsage::from_bytes(gib(8.0), gib(2.0));
        assert_eq!(usage.total, 8.0);
        assert_eq!(usage.used, 2.0);
        assert_eq!(usage.percent, 25.0);
    }

    #[test]
    fn empty_device_has_zero_percent() {
        assert_eq!(SpaceUsage::from_bytes(0, 0).percent, 0.0);
    }

    #[test]
    fn root_mount_wins_over_larger_disks() {
        let disks = [
            (Path::new("/data"), gib(100.0), gib(50.0)),
            (Path::new("/"), gib(10.0), gib(9.0)),
        ];
        let disk = pick_disk(disks.into_iter());
        assert_eq!(disk.map(|d| d.total), Some(10.0));
        assert_eq!(disk.map(|d| d.used), Some(1.0));
    }

    #[test]
    fn largest_disk_is_used_without_root() {
        let disks = [
            (Path::new("/boot"), gib(1.0), gib(1.0)),
            (Path::new("/data"), gib(100.0), gib(50.0)),
        ];
        assert_eq!(pick_disk(disks.into_iter()).map(|d| d.percent), Some(50.0));
        assert_eq!(pick_disk(std::iter::empty()), None);
    }

    #[tokio::test]
    async fn live_sample_sees_cpus_and_memory() {
        let Some(info) = sample().await else {
            panic!("sampling task failed");
        };
        assert!(info.cpu.count >= 1);
        assert!(info.memory.total > 0.0);
        assert!((0.0..=100.0).contains(&info.memory.percent));
    }
}
