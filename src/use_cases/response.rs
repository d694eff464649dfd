//! Uniform response shape of the notification use cases.

use serde::Serialize;
use serde_json::Value;

/// Result of handling a provider notification.
///
/// Contract: `handled == false` is always paired with either a non-empty
/// `message` (genuine failure, `has_errors == true`) or, for the
/// duplicate/already-settled case, `has_errors == false` and a context entry
/// identifying the duplicate.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub handled: bool,
    pub has_errors: bool,
    pub message: String,
    pub context: serde_json::Map<String, Value>,
}

impl NotificationResponse {
    pub fn success() -> Self {
        Self {
            handled: true,
            has_errors: false,
            message: String::new(),
            context: serde_json::Map::new(),
        }
    }

    /// A replayed notification for an already-settled payment. Shaped like
    /// success so provider retry storms do not raise alerts.
    pub fn duplicate() -> Self {
        let mut context = serde_json::Map::new();
        context.insert(
            "message".to_string(),
            Value::String("Duplicate notification".to_string()),
        );
        Self {
            handled: false,
            has_errors: false,
            message: String::new(),
            context,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            handled: false,
            has_errors: true,
            message: message.into(),
            context: serde_json::Map::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn is_duplicate(&self) -> bool {
        !self.handled && !self.has_errors
    }
}
