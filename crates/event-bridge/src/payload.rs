//! Helpers for picking fields out of positional platform payloads.
//!
//! Payload layouts are vendor-defined and not versioned, so every step of an
//! index path is checked and a mismatch is reported rather than assumed away.

use robot_platform::PlatformValue;

use crate::{BridgeError, Result};

/// `true` for the values the platform uses to signal "nothing detected".
pub fn is_empty(value: &PlatformValue) -> bool {
    match value {
        PlatformValue::Null => true,
        PlatformValue::Array(items) => items.is_empty(),
        PlatformValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Follow `path` through nested arrays.
pub fn value_at<'a>(
    event: &str,
    root: &'a PlatformValue,
    path: &[usize],
) -> Result<&'a PlatformValue> {
    let mut current = root;
    for (depth, &idx) in path.iter().enumerate() {
        let items = current
            .as_array()
            .ok_or_else(|| shape(event, &path[..=depth], "not a list"))?;
        current = items
            .get(idx)
            .ok_or_else(|| shape(event, &path[..=depth], "index out of range"))?;
    }
    Ok(current)
}

/// Follow `path` and require a string at the end of it.
pub fn string_at(event: &str, root: &PlatformValue, path: &[usize]) -> Result<String> {
    value_at(event, root, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| shape(event, path, "not a string"))
}

fn shape(event: &str, path: &[usize], reason: &'static str) -> BridgeError {
    BridgeError::PayloadShape {
        event: event.to_string(),
        path: path.to_vec(),
        reason,
    }
}
