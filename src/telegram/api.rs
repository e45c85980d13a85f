use serde::Deserialize;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Every Bot API response is wrapped in this envelope, errors included.
#[derive(Debug, Deserialize)]
pub(super) struct ApiEnvelope<T> {
    pub(super) ok: bool,
    pub(super) result: Option<T>,
    #[serde(default)]
    pub(super) description: Option<String>,
    #[serde(default)]
    pub(super) error_code: Option<i64>,
}

pub(super) fn body_preview(body: &[u8]) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }
    let end = body.len().min(BODY_PREVIEW_LIMIT);
    let mut preview = String::from_utf8_lossy(&body[..end]).to_string();
    if body.len() > BODY_PREVIEW_LIMIT {
        preview.push_str("...");
    }
    preview.replace('\n', "\\n")
}
