//! Field helpers shared by the builtin scanners

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Placeholder for values a resource does not have
pub const NOT_AVAILABLE: &str = "N/A";

/// Render tags as `Key=Value; Key=Value`, or `N/A` when there are none
pub fn format_tags<'a, I>(tags: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let rendered: Vec<String> = tags
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    if rendered.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        rendered.join("; ")
    }
}

/// Value of the `Name` tag, or `N/A`
pub fn name_from_tags<'a, I>(tags: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .find(|(key, _)| *key == "Name")
        .map(|(_, value)| value.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// `YYYY-MM-DD HH:MM:SS` in UTC
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Convert an SDK timestamp to a display string, `N/A` when absent
pub fn format_sdk_time(time: Option<&aws_sdk_ec2::primitives::DateTime>) -> String {
    time.and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
        .map(format_timestamp)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Optional string field, `N/A` when absent or empty
pub fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Optional scalar field, `N/A` when absent
pub fn value_or_na<T: Into<Value>>(value: Option<T>) -> Value {
    value
        .map(Into::into)
        .unwrap_or_else(|| Value::from(NOT_AVAILABLE))
}

/// `Yes`/`No` rendering used across the workbook
pub fn yes_no(flag: Option<bool>) -> &'static str {
    if flag.unwrap_or(false) {
        "Yes"
    } else {
        "No"
    }
}
