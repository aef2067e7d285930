use crm_core::{
    is_fallback_identifier, HostEnvironment, HostOwnership, NotificationError,
    NotificationPlatform, NotificationRequest, NotificationService, PlatformError, Priority,
    QueuedPlatform, RuntimeMode, ScheduledNotification, Trigger,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps the queue and counts every provider call.
#[derive(Default)]
struct CountingPlatform {
    inner: QueuedPlatform,
    init_calls: AtomicUsize,
    calls: AtomicUsize,
    fail_init: AtomicBool,
    fail_calls: AtomicBool,
}

impl CountingPlatform {
    fn failing_calls() -> Self {
        let platform = Self::default();
        platform.fail_calls.store(true, Ordering::SeqCst);
        platform
    }

    fn total_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst) + self.calls.load(Ordering::SeqCst)
    }

    fn guard(&self, operation: &'static str) -> Result<(), PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(PlatformError::new(operation, "bridge not attached"));
        }
        Ok(())
    }
}

impl NotificationPlatform for CountingPlatform {
    fn initialize(&self) -> Result<(), PlatformError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(PlatformError::new("initialize", "module failed to load"));
        }
        self.inner.initialize()
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<String, PlatformError> {
        self.guard("schedule")?;
        self.inner.schedule(request)
    }

    fn cancel(&self, identifier: &str) -> Result<(), PlatformError> {
        self.guard("cancel")?;
        self.inner.cancel(identifier)
    }

    fn cancel_all(&self) -> Result<(), PlatformError> {
        self.guard("cancel_all")?;
        self.inner.cancel_all()
    }

    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, PlatformError> {
        self.guard("list_scheduled")?;
        self.inner.list_scheduled()
    }

    fn take_due(&self, now_ms: i64) -> Result<Vec<ScheduledNotification>, PlatformError> {
        self.guard("take_due")?;
        self.inner.take_due(now_ms)
    }
}

fn sandbox() -> HostEnvironment {
    HostEnvironment {
        ownership: HostOwnership::Sandbox,
        release_build: false,
    }
}

fn native(release_build: bool) -> HostEnvironment {
    HostEnvironment {
        ownership: HostOwnership::SelfHosted,
        release_build,
    }
}

fn reminder() -> NotificationRequest {
    NotificationRequest::new("Follow up", "Call Acme Holdings back")
        .with_payload(json!({"leadId": 1}))
        .with_priority(Priority::High)
}

#[test]
fn sandboxed_host_returns_fallback_ids_and_never_touches_platform() {
    let platform = Arc::new(CountingPlatform::default());
    let service = NotificationService::start(sandbox(), platform.clone());

    assert!(service.is_sandboxed());
    assert!(!service.is_fully_supported());

    for _ in 0..3 {
        let identifier = service.schedule_notification(&reminder());
        assert!(is_fallback_identifier(&identifier), "{identifier}");
    }
    let delayed = service.schedule_with_delay(&reminder(), 30);
    assert!(is_fallback_identifier(&delayed));

    service.cancel(&delayed);
    service.cancel_all();
    assert!(service.list_scheduled().is_empty());
    assert!(service.take_due(i64::MAX).is_empty());

    assert_eq!(platform.total_calls(), 0);
}

#[test]
fn send_now_reports_unavailable_capability() {
    let service = NotificationService::start(sandbox(), Arc::new(CountingPlatform::default()));
    let err = service
        .send_now(&reminder())
        .expect_err("sandboxed send_now must fail");
    assert_eq!(err, NotificationError::Unavailable(RuntimeMode::SandboxedHost));
}

#[test]
fn native_builds_schedule_through_platform_and_list_round_trips() {
    for release_build in [false, true] {
        let platform = Arc::new(CountingPlatform::default());
        let service = NotificationService::start(native(release_build), platform.clone());
        assert!(service.is_fully_supported());
        assert!(!service.is_sandboxed());
        let expected_mode = if release_build {
            RuntimeMode::NativeProductionBuild
        } else {
            RuntimeMode::NativeDevelopmentBuild
        };
        assert_eq!(service.capability().mode, expected_mode);

        let identifier = service.schedule_notification(&reminder());
        assert!(!is_fallback_identifier(&identifier));
        let listed = service.list_scheduled();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identifier, identifier);
        assert_eq!(listed[0].request.priority, Priority::High);

        service.cancel(&identifier);
        assert!(service.list_scheduled().is_empty());
    }
}

#[test]
fn schedule_with_delay_sets_delay_trigger() {
    let service = NotificationService::start(native(false), Arc::new(QueuedPlatform::new()));
    service.schedule_with_delay(&reminder(), 90);
    let listed = service.list_scheduled();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].request.trigger, Trigger::Delay { seconds: 90 });
}

#[test]
fn failed_platform_initialization_degrades_to_unavailable() {
    let platform = Arc::new(CountingPlatform::default());
    platform.fail_init.store(true, Ordering::SeqCst);
    let service = NotificationService::start(native(true), platform.clone());

    assert!(!service.is_fully_supported());
    assert!(!service.is_sandboxed());
    assert!(is_fallback_identifier(
        &service.schedule_notification(&reminder())
    ));
    service.cancel_all();
    assert_eq!(platform.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn platform_failures_are_contained_except_for_send_now() {
    let platform = Arc::new(CountingPlatform::failing_calls());
    let service = NotificationService::start(native(false), platform.clone());
    assert!(service.is_fully_supported());

    let identifier = service.schedule_notification(&reminder());
    assert!(is_fallback_identifier(&identifier));
    service.cancel("some-platform-id");
    service.cancel_all();
    assert!(service.list_scheduled().is_empty());

    let err = service
        .send_now(&reminder())
        .expect_err("send_now must surface platform failure");
    assert!(matches!(err, NotificationError::Platform(_)));
}

#[test]
fn cancel_skips_fallback_identifiers() {
    let platform = Arc::new(CountingPlatform::default());
    let service = NotificationService::start(native(false), platform.clone());
    service.cancel("fallback-notification-1700000000000-deadbeef");
    assert_eq!(platform.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn send_now_fires_immediately() {
    let service = NotificationService::start_with_clock(
        native(false),
        Arc::new(QueuedPlatform::with_clock(|| 5_000)),
        || 5_000,
    );
    let identifier = service
        .send_now(&reminder().with_trigger(Trigger::Delay { seconds: 600 }))
        .expect("send now");
    let due = service.take_due(5_000);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].identifier, identifier);
    assert_eq!(due[0].request.trigger, Trigger::Immediate);
}

#[test]
fn force_reinitialize_replaces_cached_capability() {
    let platform = Arc::new(CountingPlatform::default());
    platform.fail_init.store(true, Ordering::SeqCst);
    let service = NotificationService::start(native(false), platform.clone());
    assert!(!service.is_fully_supported());

    platform.fail_init.store(false, Ordering::SeqCst);
    let capability = service.force_reinitialize();
    assert!(capability.notifications_available);
    assert!(service.is_fully_supported());
    assert_eq!(platform.init_calls.load(Ordering::SeqCst), 2);
}
