//! Notification request and schedule records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delivery priority hint passed to the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Default,
    Normal,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    /// Unknown values fall back to `Default`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Self::Normal,
            "high" => Self::High,
            _ => Self::Default,
        }
    }
}

/// When a notification should fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fire as soon as the platform accepts it.
    #[default]
    Immediate,
    Delay { seconds: u64 },
    At { epoch_ms: i64 },
}

impl Trigger {
    /// Absolute fire time relative to `now_ms`.
    pub fn fire_at_ms(self, now_ms: i64) -> i64 {
        match self {
            Self::Immediate => now_ms,
            Self::Delay { seconds } => {
                let delay_ms = i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
                now_ms.saturating_add(delay_ms)
            }
            Self::At { epoch_ms } => epoch_ms,
        }
    }
}

/// Content and trigger for one local notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    /// Opaque data handed back to the UI when the notification is tapped.
    pub payload: Value,
    pub sound_enabled: bool,
    pub priority: Priority,
    pub trigger: Trigger,
}

impl NotificationRequest {
    /// Immediate notification with sound and default priority.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            payload: Value::Null,
            sound_enabled: true,
            priority: Priority::Default,
            trigger: Trigger::Immediate,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_sound(mut self, sound_enabled: bool) -> Self {
        self.sound_enabled = sound_enabled;
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }
}

/// Pending notification as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub identifier: String,
    pub request: NotificationRequest,
    /// Resolved fire time in epoch milliseconds.
    pub fire_at_ms: i64,
}
