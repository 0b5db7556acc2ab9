use std::sync::Arc;
use time::OffsetDateTime;

/// Structured value as stored in platform memory.
///
/// Payloads are nested lists whose meaning depends on position; the schema is
/// owned by the vendor and may change between platform versions.
pub type PlatformValue = serde_json::Value;

/// The `(key, value, message)` triple handed to a subscribed callback.
#[derive(Clone, Debug, PartialEq)]
pub struct EventNotice {
    pub key: String,
    pub value: PlatformValue,
    pub message: String,
    pub timestamp: Option<Timestamp>,
}

impl EventNotice {
    pub fn new(key: impl Into<String>, value: PlatformValue, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value,
            message: message.into(),
            timestamp: None,
        }
    }
}

/// Callback invoked by the platform on its own delivery thread.
pub type EventCallback = Arc<dyn Fn(&EventNotice) + Send + Sync>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp(pub OffsetDateTime);
