//! Telegram-HTML rendering of error records.

use crate::report::CanonicalErrorRecord;

/// Telegram's cap on a message's visible text.
pub const MESSAGE_LIMIT: usize = 4096;
pub const STACK_TRACE_LIMIT: usize = 1000;
pub const DESCRIPTION_LIMIT: usize = 1000;
pub const URL_LIMIT: usize = 200;
pub const USER_AGENT_LIMIT: usize = 100;
pub const ADDITIONAL_DATA_LIMIT: usize = 500;
/// Identity lines: phone, user id, device, OS, error type, time.
pub const FIELD_LIMIT: usize = 100;
pub const TRUNCATED_MARKER: &str = "[truncated]";

/// Render the administrator notification for one record.
///
/// Every user-supplied section is capped, so the visible text stays below
/// [`MESSAGE_LIMIT`] however large the report is.
pub fn notification(record: &CanonicalErrorRecord) -> String {
    let mut identity = vec![
        format!("📍 <b>Platform:</b> {}", record.platform.label()),
        format!("📱 <b>User phone:</b> <code>{}</code>", field(&record.user_phone)),
    ];
    if let Some(user_id) = record.user_id.as_deref() {
        identity.push(format!("🆔 <b>User ID:</b> <code>{}</code>", field(user_id)));
    }
    identity.push(format!("💻 <b>Device:</b> {}", field(&record.device)));
    identity.push(format!("⚙️ <b>OS:</b> {}", field(&record.os_version)));
    identity.push(format!("❌ <b>Error type:</b> {}", field(&record.error_type)));
    identity.push(format!("🕐 <b>Time:</b> {}", field(&record.display_time)));

    let mut sections = vec![
        "🚨 <b>ERROR IN SAVOLIA</b>".to_string(),
        identity.join("\n"),
    ];

    if let Some(url) = record.url.as_deref() {
        sections.push(format!(
            "🔗 <b>URL:</b> <code>{}</code>",
            escape_html(&clip(url, URL_LIMIT))
        ));
    }

    sections.push(format!(
        "📝 <b>Error description:</b>\n<code>{}</code>",
        escape_html(&clip(&record.error_message, DESCRIPTION_LIMIT))
    ));

    if let Some(stack) = record.stack_trace.as_deref() {
        let body = match truncate_chars(stack, STACK_TRACE_LIMIT) {
            Some(head) => format!("{}\n{TRUNCATED_MARKER}", escape_html(head)),
            None => escape_html(stack),
        };
        sections.push(format!("🔍 <b>Stack Trace:</b>\n<pre>{body}</pre>"));
    }

    if let Some(agent) = record.user_agent.as_deref() {
        sections.push(format!(
            "🌐 <b>User Agent:</b>\n<code>{}</code>",
            escape_html(&clip(agent, USER_AGENT_LIMIT))
        ));
    }

    if let Some(data) = record.additional_data.as_ref().filter(|map| !map.is_empty()) {
        let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| format!("{data:?}"));
        sections.push(format!(
            "📊 <b>Additional data:</b>\n<pre>{}</pre>",
            escape_html(&clip(&pretty, ADDITIONAL_DATA_LIMIT))
        ));
    }

    sections.join("\n\n")
}

fn field(text: &str) -> String {
    escape_html(&clip(text, FIELD_LIMIT))
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// The first `limit` characters of `text`, or `None` when it already fits.
pub fn truncate_chars(text: &str, limit: usize) -> Option<&str> {
    text.char_indices().nth(limit).map(|(idx, _)| &text[..idx])
}

/// Cut `text` to `limit` characters, marking the cut with an ellipsis.
pub fn clip(text: &str, limit: usize) -> String {
    truncate_chars(text, limit).map_or_else(|| text.to_string(), |head| format!("{head}..."))
}
