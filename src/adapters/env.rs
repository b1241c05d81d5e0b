//! Environment variable lookup with value cleaning.

pub const FINVIZ_EXPORT_URL: &str = "FINVIZ_EXPORT_URL";
pub const CACHE_TTL_MIN: &str = "CACHE_TTL_MIN";
pub const PREMARKET_CONFIG_PATH: &str = "PREMARKET_CONFIG_PATH";
pub const PREMARKET_OUT_DIR: &str = "PREMARKET_OUT_DIR";
pub const PREMARKET_LOG_FILE: &str = "PREMARKET_LOG_FILE";
pub const PREMARKET_TZ: &str = "PREMARKET_TZ";

/// Trim, drop an inline ` # comment`, strip wrapping or dangling quotes.
/// Blank and comment-only values are `None`.
pub fn clean_value(raw: &str) -> Option<String> {
    let mut value = raw.trim();
    if value.starts_with('#') {
        return None;
    }
    let comment = value
        .char_indices()
        .find(|&(i, c)| c == '#' && value[..i].ends_with(char::is_whitespace))
        .map(|(i, _)| i);
    if let Some(idx) = comment {
        value = value[..idx].trim_end();
    }
    let value = value.trim_matches(|c: char| c == '"' || c == '\'').trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn env_str(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| clean_value(&v))
}

/// Parsed value, or `default` when unset or unparseable.
pub fn env_u64(name: &str, default: u64) -> u64 {
    match env_str(name) {
        None => default,
        Some(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(name, value = %v, default, "ignoring unparseable environment value");
            default
        }),
    }
}
