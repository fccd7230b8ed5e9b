use serde::Serialize;

/// Upper bound on how much of a payload ends up in one log line.
const MAX_LOGGED_CHARS: usize = 4096;

/// Renders `value` as pretty JSON and hands it to `log_action`, only when DEBUG is on.
pub(crate) fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize + ?Sized,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    log_action(truncate_for_log(&pretty_json));
}

fn truncate_for_log(text: &str) -> &str {
    match text.char_indices().nth(MAX_LOGGED_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
