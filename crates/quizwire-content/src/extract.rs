//! Pulling JSON out of raw model text.
//!
//! Models are asked to answer with nothing but JSON, and mostly don't:
//! completions arrive wrapped in prose, markdown fences, or both. These
//! helpers cut out the first JSON array or object so the caller can
//! hand it to serde.

/// Returns the slice spanning the first `[` through the last `]`, with
/// any markdown code fences stripped first. `None` if no array-shaped
/// region exists.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let text = strip_fences(text);
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Returns the slice spanning the first `{` through the last `}`.
/// `None` if no object-shaped region exists.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = strip_fences(text);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Trims everything outside the outermost code fence, if one is
/// present. Fence language tags ("```json") are dropped with the
/// opening line.
fn strip_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    // Skip the language tag line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}
