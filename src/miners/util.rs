use crate::data::status::UNAVAILABLE;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static POOL_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"://([^:]+)").expect("Failed to compile regex"));

const DIFFICULTY_UNITS: [(f64, &str); 5] = [
    (1e15, "P"),
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "K"),
];

const MAX_POOL_LEN: usize = 20;

/// Reads a JSON number, or a string holding one, as `f64`.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Scales a raw hash rate down to TH/s, two decimals.
pub fn format_hashrate(value: f64, divisor: f64) -> String {
    let ths = value / divisor;
    if ths.is_finite() {
        format!("{ths:.2}")
    } else {
        UNAVAILABLE.to_string()
    }
}

/// Formats a share difficulty with the largest fitting SI suffix, e.g. `1.50T`.
pub fn format_difficulty(value: &Value) -> String {
    let Some(diff) = value_as_f64(value).filter(|d| d.is_finite()) else {
        return UNAVAILABLE.to_string();
    };

    for (threshold, unit) in DIFFICULTY_UNITS {
        if diff >= threshold {
            return format!("{:.2}{unit}", diff / threshold);
        }
    }
    format!("{diff:.0}")
}

/// Formats whole seconds as `1d01h`, `1h30m` or `2m`.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d{hours:02}h")
    } else if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

/// Shortens a pool URL to its host, capped at 20 characters.
pub fn format_pool(url: &str) -> String {
    let host = POOL_HOST
        .captures(url)
        .and_then(|c| c.get(1))
        .map_or(url, |m| m.as_str());
    host.chars().take(MAX_POOL_LEN).collect()
}
