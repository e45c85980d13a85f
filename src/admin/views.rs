//! Panel texts and keyboards. Everything user-supplied is escaped.

use crate::format::{escape_html, truncate_chars};
use crate::server::status::format_uptime;
use crate::state::{ErrorSummary, StatsSnapshot};
use crate::system::SystemInfo;
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::types::Platform;

use super::AdminAction;

pub const STATS_RECENT: usize = 5;
pub const LOG_RECENT: usize = 10;
const LOG_TYPE_WIDTH: usize = 25;

/// A rendered panel screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

fn button(text: &str, action: AdminAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.as_str())
}

fn back_to(action: AdminAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🔙 Back", action)]])
}

const fn mode_label(maintenance: bool) -> &'static str {
    if maintenance {
        "🔴 Maintenance"
    } else {
        "🟢 Active"
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |value| format!("{value}%"))
}

pub fn main_panel(
    service_name: &str,
    snapshot: &StatsSnapshot,
    system: Option<&SystemInfo>,
) -> View {
    let text = format!(
        "🚀 <b>{}</b>\n\n\
         📊 <b>Statistics:</b>\n\
         • Errors: {}\n\
         • Uptime: {}\n\
         • Mode: {}\n\n\
         🖥️ <b>System:</b>\n\
         • CPU: {}\n\
         • RAM: {}\n\
         • Disk: {}\n\n\
         Choose an action:",
        escape_html(service_name),
        snapshot.error_count,
        format_uptime(snapshot.uptime),
        mode_label(snapshot.maintenance_mode),
        percent(system.map(|info| info.cpu.percent)),
        percent(system.map(|info| info.memory.percent)),
        percent(system.and_then(|info| info.disk).map(|disk| disk.percent)),
    );
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![
            button("📊 Statistics", AdminAction::Stats),
            button("🖥️ System", AdminAction::System),
        ],
        vec![
            button("⚙️ Management", AdminAction::Management),
            button("📝 Logs", AdminAction::Logs),
        ],
        vec![button("🔄 Refresh", AdminAction::Refresh)],
    ]);
    View { text, keyboard }
}

pub fn stats(snapshot: &StatsSnapshot, recent: &[ErrorSummary]) -> View {
    let mut text = format!(
        "📊 <b>Detailed statistics</b>\n\n\
         🔢 <b>Totals:</b>\n\
         • Total errors: {}\n\
         • Uptime: {}\n\n\
         🏢 <b>By platform:</b>",
        snapshot.error_count,
        format_uptime(snapshot.uptime),
    );
    for (platform, count) in &snapshot.platform_stats {
        let icon = Platform::from(platform.as_str()).icon();
        text.push_str(&format!("\n• {icon} {}: {count}", escape_html(platform)));
    }
    if !recent.is_empty() {
        text.push_str("\n\n📋 <b>Recent errors:</b>");
        for (idx, entry) in recent.iter().enumerate() {
            text.push_str(&format!(
                "\n{}. {} | {}",
                idx + 1,
                entry.recorded_at.format("%H:%M:%S"),
                escape_html(entry.platform.as_str()),
            ));
        }
    }
    View {
        text,
        keyboard: back_to(AdminAction::Refresh),
    }
}

pub fn system(info: Option<&SystemInfo>, snapshot: &StatsSnapshot) -> View {
    let text = match info {
        None => "❌ <b>System information is unavailable</b>".to_string(),
        Some(info) => {
            let disk = info.disk.map_or_else(
                || "• N/A".to_string(),
                |disk| format!("• {} GB / {} GB\n• {}%", disk.used, disk.total, disk.percent),
            );
            format!(
                "🖥️ <b>System monitoring</b>\n\n\
                 ⚡ <b>CPU:</b> {}% ({} cores)\n\n\
                 💾 <b>Memory:</b>\n\
                 • {} GB / {} GB\n\
                 • {}%\n\n\
                 💿 <b>Disk:</b>\n\
                 {disk}\n\n\
                 🆙 <b>Uptime:</b> {}",
                info.cpu.percent,
                info.cpu.count,
                info.memory.used,
                info.memory.total,
                info.memory.percent,
                format_uptime(snapshot.uptime),
            )
        }
    };
    View {
        text,
        keyboard: back_to(AdminAction::Refresh),
    }
}

pub fn management(snapshot: &StatsSnapshot) -> View {
    let text = format!(
        "⚙️ <b>Control panel</b>\n\n\
         🤖 <b>Status:</b>\n\
         • Mode: {}\n\
         • Errors processed: {}\n\
         • Log entries: {}\n\n\
         🛠️ Available actions:",
        mode_label(snapshot.maintenance_mode),
        snapshot.error_count,
        snapshot.recent_errors_count,
    );
    let toggle = if snapshot.maintenance_mode {
        "🟢 Leave maintenance"
    } else {
        "🚫 Enter maintenance"
    };
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![button("📤 Send test error", AdminAction::TestError)],
        vec![button(toggle, AdminAction::ToggleMaintenance)],
        vec![
            button("🧹 Clear logs", AdminAction::ClearLogs),
            button("♻️ Reset stats", AdminAction::ResetStats),
        ],
        vec![button("🔙 Back", AdminAction::Refresh)],
    ]);
    View { text, keyboard }
}

pub fn logs(recent: &[ErrorSummary]) -> View {
    let text = if recent.is_empty() {
        "📝 <b>Error log</b>\n\n❌ No entries.".to_string()
    } else {
        let mut text = format!("📝 <b>Error log</b> (last {})", recent.len());
        for (idx, entry) in recent.iter().enumerate() {
            let error_type = truncate_chars(&entry.error_type, LOG_TYPE_WIDTH)
                .unwrap_or(&entry.error_type);
            text.push_str(&format!(
                "\n\n{}. {} | {} {}\n   {}",
                idx + 1,
                entry.recorded_at.format("%d.%m %H:%M"),
                entry.platform.icon(),
                escape_html(entry.platform.as_str()),
                escape_html(error_type),
            ));
        }
        text
    };
    View {
        text,
        keyboard: back_to(AdminAction::Refresh),
    }
}

pub fn test_result(delivered: bool) -> View {
    let text = if delivered {
        "📤 <b>Test error sent!</b>\n\nCheck that the notification arrived."
    } else {
        "❌ <b>Test error could not be delivered</b>"
    };
    View {
        text: text.to_string(),
        keyboard: back_to(AdminAction::Management),
    }
}
