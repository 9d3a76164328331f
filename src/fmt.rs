use crate::models::Timestamp;

/// `YYYY-MM-DD` in UTC.
pub fn short_date(ts: Timestamp) -> String {
    ts.to_datetime().format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD HH:MM` in UTC.
pub fn date_time(ts: Timestamp) -> String {
    ts.to_datetime().format("%Y-%m-%d %H:%M").to_string()
}

/// Cut `text` to at most `max` characters, ending in an ellipsis when cut.
/// Newlines collapse to spaces.
pub fn truncate(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        return flat;
    }
    if max == 0 {
        return String::new();
    }
    let mut cut: String = flat.chars().take(max - 1).collect();
    cut.push('\u{2026}');
    cut
}

/// Placeholder for empty cells.
pub fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "\u{2014}"
    } else {
        text
    }
}
