//! Notification availability service.
//!
//! # Responsibility
//! - Expose one scheduling/cancellation API that UI code calls unconditionally.
//! - Degrade to fallback values and no-ops when notifications are unavailable.
//!
//! # Invariants
//! - Only `send_now` returns errors; every other operation absorbs failures.
//! - Unavailable capability means zero provider calls.
//! - At most one capability re-probe runs at a time; callers that arrive
//!   while it runs reuse its result.

use crate::notification::capability::{
    detect_capability, HostEnvironment, RuntimeCapability, RuntimeMode,
};
use crate::notification::platform::{
    system_clock_ms, Clock, DisabledPlatform, NotificationPlatform, PlatformError,
};
use crate::notification::request::{NotificationRequest, ScheduledNotification, Trigger};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use uuid::Uuid;

/// Prefix of identifiers synthesized when nothing was scheduled.
pub const FALLBACK_ID_PREFIX: &str = "fallback-notification-";

/// Returns whether `identifier` was synthesized instead of platform-issued.
pub fn is_fallback_identifier(identifier: &str) -> bool {
    identifier.starts_with(FALLBACK_ID_PREFIX)
}

fn fallback_identifier(now_ms: i64) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{FALLBACK_ID_PREFIX}{now_ms}-{}", &nonce[..8])
}

/// Errors surfaced by user-triggered "send now" actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    Unavailable(RuntimeMode),
    Platform(PlatformError),
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(mode) => write!(
                f,
                "notifications are unavailable in runtime mode {}",
                mode.as_str()
            ),
            Self::Platform(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(_) => None,
            Self::Platform(err) => Some(err),
        }
    }
}

impl From<PlatformError> for NotificationError {
    fn from(value: PlatformError) -> Self {
        Self::Platform(value)
    }
}

struct ActiveProvider {
    capability: RuntimeCapability,
    provider: Arc<dyn NotificationPlatform>,
}

#[derive(Debug, Default)]
struct ReinitState {
    in_flight: bool,
    waiters: usize,
    generation: u64,
}

/// Marks the running re-probe; clears it on drop, even when the probe panics.
struct ReinitTicket<'a> {
    service: &'a NotificationService,
}

impl Drop for ReinitTicket<'_> {
    fn drop(&mut self) {
        let mut state = self.service.lock_reinit();
        state.in_flight = false;
        state.generation = state.generation.wrapping_add(1);
        drop(state);
        self.service.reinit_done.notify_all();
    }
}

/// Notification facade owned by the composition root.
pub struct NotificationService {
    env: HostEnvironment,
    platform: Arc<dyn NotificationPlatform>,
    clock: Clock,
    active: RwLock<ActiveProvider>,
    reinit: Mutex<ReinitState>,
    reinit_done: Condvar,
}

impl NotificationService {
    /// Detects capability once and selects the provider.
    pub fn start(env: HostEnvironment, platform: Arc<dyn NotificationPlatform>) -> Self {
        Self::start_with_clock(env, platform, system_clock_ms)
    }

    pub fn start_with_clock(
        env: HostEnvironment,
        platform: Arc<dyn NotificationPlatform>,
        clock: Clock,
    ) -> Self {
        let active = select_provider(&env, &platform);
        Self {
            env,
            platform,
            clock,
            active: RwLock::new(active),
            reinit: Mutex::new(ReinitState::default()),
            reinit_done: Condvar::new(),
        }
    }

    /// Cached capability snapshot.
    pub fn capability(&self) -> RuntimeCapability {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .capability
    }

    pub fn is_fully_supported(&self) -> bool {
        self.capability().notifications_available
    }

    pub fn is_sandboxed(&self) -> bool {
        self.capability().mode == RuntimeMode::SandboxedHost
    }

    /// Schedules a notification, or returns a fallback identifier.
    ///
    /// Never fails: unavailable capability and provider errors both yield an
    /// identifier starting with [`FALLBACK_ID_PREFIX`].
    pub fn schedule_notification(&self, request: &NotificationRequest) -> String {
        let Some(provider) = self.available_provider() else {
            warn!(
                "event=notification_schedule module=notification status=skipped reason=unavailable"
            );
            return fallback_identifier((self.clock)());
        };

        match provider.schedule(request) {
            Ok(identifier) => {
                debug!(
                    "event=notification_schedule module=notification status=ok priority={}",
                    request.priority.as_str()
                );
                identifier
            }
            Err(err) => {
                error!(
                    "event=notification_schedule module=notification status=error error={}",
                    err
                );
                fallback_identifier((self.clock)())
            }
        }
    }

    /// Schedules `request` to fire after `seconds`.
    pub fn schedule_with_delay(&self, request: &NotificationRequest, seconds: u64) -> String {
        let delayed = request
            .clone()
            .with_trigger(Trigger::Delay { seconds });
        self.schedule_notification(&delayed)
    }

    /// Fires a notification now and reports failure to the caller.
    ///
    /// # Errors
    /// - `Unavailable` when the runtime cannot deliver notifications.
    /// - `Platform` when the provider rejects the call.
    pub fn send_now(&self, request: &NotificationRequest) -> Result<String, NotificationError> {
        let Some(provider) = self.available_provider() else {
            return Err(NotificationError::Unavailable(self.capability().mode));
        };
        let immediate = request.clone().with_trigger(Trigger::Immediate);
        let identifier = provider.schedule(&immediate).map_err(|err| {
            error!(
                "event=notification_send_now module=notification status=error error={}",
                err
            );
            NotificationError::from(err)
        })?;
        info!("event=notification_send_now module=notification status=ok");
        Ok(identifier)
    }

    /// Cancels one notification; failures are logged, not returned.
    pub fn cancel(&self, identifier: &str) {
        let Some(provider) = self.available_provider() else {
            warn!("event=notification_cancel module=notification status=skipped reason=unavailable");
            return;
        };
        if is_fallback_identifier(identifier) {
            debug!("event=notification_cancel module=notification status=skipped reason=fallback_id");
            return;
        }
        if let Err(err) = provider.cancel(identifier) {
            error!(
                "event=notification_cancel module=notification status=error error={}",
                err
            );
        }
    }

    /// Cancels every pending notification; failures are logged, not returned.
    pub fn cancel_all(&self) {
        let Some(provider) = self.available_provider() else {
            warn!(
                "event=notification_cancel_all module=notification status=skipped reason=unavailable"
            );
            return;
        };
        if let Err(err) = provider.cancel_all() {
            error!(
                "event=notification_cancel_all module=notification status=error error={}",
                err
            );
        }
    }

    /// Pending notifications; empty when unavailable or on provider failure.
    pub fn list_scheduled(&self) -> Vec<ScheduledNotification> {
        let Some(provider) = self.available_provider() else {
            return Vec::new();
        };
        provider.list_scheduled().unwrap_or_else(|err| {
            error!(
                "event=notification_list module=notification status=error error={}",
                err
            );
            Vec::new()
        })
    }

    /// Notifications due at `now_ms`, removed from the pending set.
    pub fn take_due(&self, now_ms: i64) -> Vec<ScheduledNotification> {
        let Some(provider) = self.available_provider() else {
            return Vec::new();
        };
        provider.take_due(now_ms).unwrap_or_else(|err| {
            error!(
                "event=notification_take_due module=notification status=error error={}",
                err
            );
            Vec::new()
        })
    }

    /// Re-runs detection and provider initialization.
    ///
    /// Callers that arrive while a re-probe is in flight wait for it and
    /// return its result instead of probing again.
    pub fn force_reinitialize(&self) -> RuntimeCapability {
        let mut state = self.lock_reinit();
        if state.in_flight {
            let joined = state.generation;
            state.waiters += 1;
            let mut state = self
                .reinit_done
                .wait_while(state, |state| state.generation == joined)
                .unwrap_or_else(PoisonError::into_inner);
            state.waiters -= 1;
            drop(state);
            debug!("event=notification_reinit module=notification status=joined");
            return self.capability();
        }
        state.in_flight = true;
        drop(state);

        let ticket = ReinitTicket { service: self };
        let active = select_provider(&self.env, &self.platform);
        let capability = active.capability;
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = active;
        drop(ticket);

        info!(
            "event=notification_reinit module=notification status=ok mode={} available={}",
            capability.mode.as_str(),
            capability.notifications_available
        );
        capability
    }

    fn lock_reinit(&self) -> std::sync::MutexGuard<'_, ReinitState> {
        self.reinit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available_provider(&self) -> Option<Arc<dyn NotificationPlatform>> {
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        if active.capability.notifications_available {
            Some(Arc::clone(&active.provider))
        } else {
            None
        }
    }
}

fn select_provider(
    env: &HostEnvironment,
    platform: &Arc<dyn NotificationPlatform>,
) -> ActiveProvider {
    let capability = detect_capability(env, platform.as_ref());
    let provider: Arc<dyn NotificationPlatform> = if capability.notifications_available {
        Arc::clone(platform)
    } else {
        Arc::new(DisabledPlatform)
    };
    ActiveProvider {
        capability,
        provider,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        fallback_identifier, is_fallback_identifier, NotificationError, NotificationService,
    };
    use crate::notification::capability::{HostEnvironment, HostOwnership, RuntimeMode};
    use crate::notification::platform::{NotificationPlatform, PlatformError, QueuedPlatform};
    use crate::notification::request::{NotificationRequest, ScheduledNotification};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};

    /// Blocks the first re-probe between two barriers so the test decides
    /// when it finishes.
    struct GatedPlatform {
        inner: QueuedPlatform,
        init_calls: AtomicUsize,
        probe_started: Barrier,
        probe_release: Barrier,
    }

    impl GatedPlatform {
        fn new() -> Self {
            Self {
                inner: QueuedPlatform::new(),
                init_calls: AtomicUsize::new(0),
                probe_started: Barrier::new(2),
                probe_release: Barrier::new(2),
            }
        }
    }

    impl NotificationPlatform for GatedPlatform {
        fn initialize(&self) -> Result<(), PlatformError> {
            // Call 1 is the startup probe; call 2 is the first re-probe.
            if self.init_calls.fetch_add(1, Ordering::SeqCst) == 1 {
                self.probe_started.wait();
                self.probe_release.wait();
            }
            self.inner.initialize()
        }

        fn schedule(&self, request: &NotificationRequest) -> Result<String, PlatformError> {
            self.inner.schedule(request)
        }

        fn cancel(&self, identifier: &str) -> Result<(), PlatformError> {
            self.inner.cancel(identifier)
        }

        fn cancel_all(&self) -> Result<(), PlatformError> {
            self.inner.cancel_all()
        }

        fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, PlatformError> {
            self.inner.list_scheduled()
        }
    }

    fn wait_for_waiters(service: &NotificationService, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while service.lock_reinit().waiters < expected {
            assert!(Instant::now() < deadline, "re-probe callers never queued");
            thread::yield_now();
        }
    }

    #[test]
    fn fallback_identifier_carries_prefix_and_timestamp() {
        let identifier = fallback_identifier(1_700_000_000_123);
        assert!(is_fallback_identifier(&identifier));
        assert!(identifier.contains("1700000000123"));
        assert_ne!(identifier, fallback_identifier(1_700_000_000_123));
    }

    #[test]
    fn unavailable_error_names_mode() {
        let err = NotificationError::Unavailable(RuntimeMode::SandboxedHost);
        assert!(err.to_string().contains("sandboxed_host"));
    }

    #[test]
    fn callers_arriving_during_reprobe_share_its_result() {
        let platform = Arc::new(GatedPlatform::new());
        let env = HostEnvironment {
            ownership: HostOwnership::SelfHosted,
            release_build: false,
        };
        let service = Arc::new(NotificationService::start(env, platform.clone()));
        assert_eq!(platform.init_calls.load(Ordering::SeqCst), 1);

        let first = {
            let service = Arc::clone(&service);
            thread::spawn(move || service.force_reinitialize())
        };
        platform.probe_started.wait();

        let joiners = (0..3)
            .map(|_| {
                let service = Arc::clone(&service);
                thread::spawn(move || service.force_reinitialize())
            })
            .collect::<Vec<_>>();
        wait_for_waiters(&service, 3);
        platform.probe_release.wait();

        let probed = first.join().expect("probing thread");
        assert!(probed.notifications_available);
        for joiner in joiners {
            assert_eq!(joiner.join().expect("joining thread"), probed);
        }
        assert_eq!(platform.init_calls.load(Ordering::SeqCst), 2);
        assert!(!service.lock_reinit().in_flight);
    }

    #[test]
    fn sequential_reinitialize_probes_each_time() {
        let platform = Arc::new(QueuedPlatform::new());
        let env = HostEnvironment {
            ownership: HostOwnership::SelfHosted,
            release_build: true,
        };
        let service = NotificationService::start(env, platform);
        service.force_reinitialize();
        service.force_reinitialize();
        assert_eq!(service.lock_reinit().generation, 2);
    }
}
