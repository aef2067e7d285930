//! Platform notification provider contract and built-in providers.
//!
//! # Responsibility
//! - Abstract the host notification API behind one fallible trait.
//! - Provide a disabled stub and an in-process queue implementation.
//!
//! # Invariants
//! - Every provider call is fallible; callers contain failures.
//! - `QueuedPlatform` identifiers are unique for the process lifetime.

use crate::notification::request::{NotificationRequest, ScheduledNotification};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Millisecond wall clock used to resolve triggers.
pub type Clock = fn() -> i64;

/// Current unix time in milliseconds; `0` if the clock is before the epoch.
pub fn system_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Host notification API.
pub trait NotificationPlatform: Send + Sync {
    /// Installs handlers and verifies the provider is usable.
    fn initialize(&self) -> Result<(), PlatformError>;

    /// Schedules one notification and returns the platform-issued identifier.
    fn schedule(&self, request: &NotificationRequest) -> Result<String, PlatformError>;

    fn cancel(&self, identifier: &str) -> Result<(), PlatformError>;

    fn cancel_all(&self) -> Result<(), PlatformError>;

    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, PlatformError>;

    /// Removes and returns notifications due at `now_ms`.
    ///
    /// Providers that deliver natively have nothing to hand back.
    fn take_due(&self, _now_ms: i64) -> Result<Vec<ScheduledNotification>, PlatformError> {
        Ok(Vec::new())
    }
}

/// Failed provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub operation: &'static str,
    pub message: String,
}

impl PlatformError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "notification platform call `{}` failed: {}",
            self.operation, self.message
        )
    }
}

impl Error for PlatformError {}

/// Provider selected when notifications cannot work in this host.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPlatform;

const DISABLED_MESSAGE: &str = "notifications are disabled in this runtime";

impl NotificationPlatform for DisabledPlatform {
    fn initialize(&self) -> Result<(), PlatformError> {
        Err(PlatformError::new("initialize", DISABLED_MESSAGE))
    }

    fn schedule(&self, _request: &NotificationRequest) -> Result<String, PlatformError> {
        Err(PlatformError::new("schedule", DISABLED_MESSAGE))
    }

    fn cancel(&self, _identifier: &str) -> Result<(), PlatformError> {
        Err(PlatformError::new("cancel", DISABLED_MESSAGE))
    }

    fn cancel_all(&self) -> Result<(), PlatformError> {
        Err(PlatformError::new("cancel_all", DISABLED_MESSAGE))
    }

    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, PlatformError> {
        Err(PlatformError::new("list_scheduled", DISABLED_MESSAGE))
    }
}

/// In-process pending queue drained by the UI host.
///
/// The host polls [`NotificationPlatform::take_due`] and posts each returned
/// notification through its native plugin.
pub struct QueuedPlatform {
    clock: Clock,
    pending: Mutex<BTreeMap<String, ScheduledNotification>>,
}

impl Default for QueuedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl QueuedPlatform {
    pub fn new() -> Self {
        Self::with_clock(system_clock_ms)
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, BTreeMap<String, ScheduledNotification>>, PlatformError> {
        self.pending
            .lock()
            .map_err(|_| PlatformError::new(operation, "pending queue lock poisoned"))
    }
}

impl NotificationPlatform for QueuedPlatform {
    fn initialize(&self) -> Result<(), PlatformError> {
        self.lock("initialize").map(|_| ())
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<String, PlatformError> {
        let identifier = Uuid::new_v4().to_string();
        let fire_at_ms = request.trigger.fire_at_ms((self.clock)());
        self.lock("schedule")?.insert(
            identifier.clone(),
            ScheduledNotification {
                identifier: identifier.clone(),
                request: request.clone(),
                fire_at_ms,
            },
        );
        Ok(identifier)
    }

    fn cancel(&self, identifier: &str) -> Result<(), PlatformError> {
        self.lock("cancel")?.remove(identifier);
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), PlatformError> {
        self.lock("cancel_all")?.clear();
        Ok(())
    }

    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, PlatformError> {
        let mut items = self
            .lock("list_scheduled")?
            .values()
            .cloned()
            .collect::<Vec<_>>();
        items.sort_by(|a, b| {
            a.fire_at_ms
                .cmp(&b.fire_at_ms)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        Ok(items)
    }

    fn take_due(&self, now_ms: i64) -> Result<Vec<ScheduledNotification>, PlatformError> {
        let mut pending = self.lock("take_due")?;
        let due_ids = pending
            .values()
            .filter(|item| item.fire_at_ms <= now_ms)
            .map(|item| item.identifier.clone())
            .collect::<Vec<_>>();
        let mut due = due_ids
            .iter()
            .filter_map(|id| pending.remove(id))
            .collect::<Vec<_>>();
        due.sort_by_key(|item| item.fire_at_ms);
        Ok(due)
    }
}
