//! FFI use-case API for the mobile UI.
//!
//! # Responsibility
//! - Expose policy and notification use cases to Dart via FRB.
//! - Own the process-wide `CrmCore` composition root.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Policy errors surface as denied decisions, never as thrown errors.
//! - Only `notification_send_now` reports notification failures to the UI.

use crm_core::{
    add_options, core_version as core_version_inner, init_logging as init_logging_inner,
    is_fallback_identifier, ping as ping_inner, Action, ActionRequest, AppConfig, CrmCore,
    NotificationRequest, Priority, Resource, ResourceKind, Role, ScheduledNotification, Trigger,
};
use log::warn;
use serde_json::Value;
use std::sync::OnceLock;

static CORE: OnceLock<CrmCore> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Authorization answer for one UI affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecisionResponse {
    pub allowed: bool,
    /// Stable reason code, e.g. `owner_mismatch`.
    pub reason: String,
}

/// Quick-add menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOptionItem {
    /// Resource kind created by this entry (`user|lead|property|note|calling_task`).
    pub kind: String,
    pub label: String,
}

/// Notification capability snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationStatusResponse {
    /// `sandboxed_host|native_development_build|native_production_build`.
    pub mode: String,
    pub fully_supported: bool,
    pub sandboxed: bool,
}

/// Pending notification row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotificationItem {
    pub identifier: String,
    pub title: String,
    pub body: String,
    /// Payload as JSON text; empty when absent.
    pub payload_json: String,
    pub sound_enabled: bool,
    pub priority: String,
    pub fire_at_ms: i64,
}

/// Result envelope for notification actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationActionResponse {
    pub ok: bool,
    pub identifier: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

/// Decides whether `role` may perform `action` on a resource of `kind`.
///
/// `resource_json` is the backend record; omit it for creation checks.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - Unknown kinds, actions or malformed records yield a denied decision.
#[flutter_rust_bridge::frb(sync)]
pub fn policy_authorize(
    role: String,
    actor_user_id: String,
    kind: String,
    action: String,
    resource_json: Option<String>,
) -> PolicyDecisionResponse {
    let Some(kind) = ResourceKind::parse(&kind) else {
        return denied("unknown_resource_kind");
    };
    let Some(action) = Action::parse(&action) else {
        return denied("unknown_action");
    };
    let resource = match resource_json.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match Resource::from_json_str(kind, raw) {
            Ok(resource) => Some(resource),
            Err(err) => {
                warn!("event=ffi_policy_authorize module=policy status=denied error={err}");
                return denied("invalid_resource");
            }
        },
    };

    let decision = core().policy().authorize(&ActionRequest {
        role: Role::from_session(&role),
        actor_user_id: actor_user_id.as_str(),
        kind,
        resource: resource.as_ref(),
        action,
    });
    PolicyDecisionResponse {
        allowed: decision.allowed,
        reason: decision.reason.as_str().to_string(),
    }
}

/// Sorted field names of `resource_json` that `role` may see.
///
/// Returns an empty list for unknown kinds or malformed records.
#[flutter_rust_bridge::frb(sync)]
pub fn policy_visible_fields(role: String, kind: String, resource_json: String) -> Vec<String> {
    match parse_resource(&kind, &resource_json) {
        Some(resource) => core()
            .policy()
            .visible_fields(Role::from_session(&role), &resource)
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}

/// Record as `role` should see it, with hidden values replaced, as JSON text.
///
/// Returns `{}` for unknown kinds or malformed records.
#[flutter_rust_bridge::frb(sync)]
pub fn policy_redact(role: String, kind: String, resource_json: String) -> String {
    let Some(resource) = parse_resource(&kind, &resource_json) else {
        return "{}".to_string();
    };
    let redacted = core()
        .policy()
        .redact(Role::from_session(&role), &resource);
    Value::Object(redacted).to_string()
}

/// Quick-add options for `role`; empty means "use the default single action".
#[flutter_rust_bridge::frb(sync)]
pub fn policy_add_options(role: String) -> Vec<AddOptionItem> {
    add_options(Role::from_session(&role))
        .into_iter()
        .map(|option| AddOptionItem {
            kind: option.kind.resource_kind().as_str().to_string(),
            label: option.label.to_string(),
        })
        .collect()
}

/// Current notification capability.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_status() -> NotificationStatusResponse {
    status_response(core())
}

/// Schedules a local notification.
///
/// Trigger selection: `at_epoch_ms` wins over `delay_seconds`; neither means
/// fire immediately.
///
/// # FFI contract
/// - Never fails; unavailable runtimes return an id starting with
///   `fallback-notification-`.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_schedule(
    title: String,
    body: String,
    payload_json: Option<String>,
    sound_enabled: bool,
    priority: String,
    delay_seconds: Option<u64>,
    at_epoch_ms: Option<i64>,
) -> String {
    let request = build_request(
        title,
        body,
        payload_json,
        sound_enabled,
        &priority,
        delay_seconds,
        at_epoch_ms,
    );
    core().notifications().schedule_notification(&request)
}

/// Posts a notification now and reports failure for the UI to show.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_send_now(
    title: String,
    body: String,
    payload_json: Option<String>,
    priority: String,
) -> NotificationActionResponse {
    let request = build_request(title, body, payload_json, true, &priority, None, None);
    match core().notifications().send_now(&request) {
        Ok(identifier) => NotificationActionResponse {
            ok: true,
            identifier: Some(identifier),
            message: "Notification sent.".to_string(),
        },
        Err(err) => NotificationActionResponse {
            ok: false,
            identifier: None,
            message: format!("notification_send_now failed: {err}"),
        },
    }
}

/// Cancels one notification. Fallback ids are accepted and ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_cancel(identifier: String) {
    core().notifications().cancel(identifier.trim());
}

/// Cancels every pending notification.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_cancel_all() {
    core().notifications().cancel_all();
}

/// Pending notifications ordered by fire time.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_list_scheduled() -> Vec<ScheduledNotificationItem> {
    core()
        .notifications()
        .list_scheduled()
        .into_iter()
        .map(to_scheduled_item)
        .collect()
}

/// Notifications due at `now_epoch_ms`; the host posts them natively.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_take_due(now_epoch_ms: i64) -> Vec<ScheduledNotificationItem> {
    core()
        .notifications()
        .take_due(now_epoch_ms)
        .into_iter()
        .map(to_scheduled_item)
        .collect()
}

/// Diagnostic re-probe of notification capability.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_force_reinitialize() -> NotificationStatusResponse {
    let core = core();
    core.notifications().force_reinitialize();
    status_response(core)
}

/// Returns whether `identifier` was synthesized because nothing was scheduled.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_is_fallback_id(identifier: String) -> bool {
    is_fallback_identifier(&identifier)
}

fn core() -> &'static CrmCore {
    CORE.get_or_init(|| {
        let config = AppConfig::from_env().unwrap_or_else(|err| {
            warn!("event=ffi_config module=config status=fallback error={err}");
            AppConfig::default()
        });
        CrmCore::new(config)
    })
}

fn denied(reason: &str) -> PolicyDecisionResponse {
    PolicyDecisionResponse {
        allowed: false,
        reason: reason.to_string(),
    }
}

fn parse_resource(kind: &str, resource_json: &str) -> Option<Resource> {
    let kind = ResourceKind::parse(kind)?;
    Resource::from_json_str(kind, resource_json)
        .map_err(|err| warn!("event=ffi_parse_resource module=policy status=error error={err}"))
        .ok()
}

fn build_request(
    title: String,
    body: String,
    payload_json: Option<String>,
    sound_enabled: bool,
    priority: &str,
    delay_seconds: Option<u64>,
    at_epoch_ms: Option<i64>,
) -> NotificationRequest {
    let payload = payload_json
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .unwrap_or(Value::Null);
    let trigger = match (at_epoch_ms, delay_seconds) {
        (Some(epoch_ms), _) => Trigger::At { epoch_ms },
        (None, Some(seconds)) => Trigger::Delay { seconds },
        (None, None) => Trigger::Immediate,
    };
    NotificationRequest::new(title.trim(), body)
        .with_payload(payload)
        .with_sound(sound_enabled)
        .with_priority(Priority::parse(priority))
        .with_trigger(trigger)
}

fn status_response(core: &CrmCore) -> NotificationStatusResponse {
    let notifications = core.notifications();
    NotificationStatusResponse {
        mode: notifications.capability().mode.as_str().to_string(),
        fully_supported: notifications.is_fully_supported(),
        sandboxed: notifications.is_sandboxed(),
    }
}

fn to_scheduled_item(item: ScheduledNotification) -> ScheduledNotificationItem {
    let payload_json = if item.request.payload.is_null() {
        String::new()
    } else {
        item.request.payload.to_string()
    };
    ScheduledNotificationItem {
        identifier: item.identifier,
        title: item.request.title,
        body: item.request.body,
        payload_json,
        sound_enabled: item.request.sound_enabled,
        priority: item.request.priority.as_str().to_string(),
        fire_at_ms: item.fire_at_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, notification_cancel, notification_is_fallback_id,
        notification_schedule, notification_status, ping, policy_add_options, policy_authorize,
        policy_redact, policy_visible_fields,
    };

    const PROPERTY: &str =
        r#"{"id": 2, "address": "12 Harbour Rd", "acquisitionCost": 450000, "createdBy": {"id": 7}}"#;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/crm-logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn authorize_checks_ownership_for_users() {
        let owner = policy_authorize(
            "USER".to_string(),
            "7".to_string(),
            "property".to_string(),
            "delete".to_string(),
            Some(PROPERTY.to_string()),
        );
        assert!(owner.allowed);
        assert_eq!(owner.reason, "owner_match");

        let stranger = policy_authorize(
            "user".to_string(),
            "9".to_string(),
            "property".to_string(),
            "edit".to_string(),
            Some(PROPERTY.to_string()),
        );
        assert!(!stranger.allowed);
    }

    #[test]
    fn authorize_denies_unknown_inputs() {
        let unknown_kind = policy_authorize(
            "DIRECTOR".to_string(),
            "1".to_string(),
            "invoice".to_string(),
            "view".to_string(),
            None,
        );
        assert!(!unknown_kind.allowed);
        assert_eq!(unknown_kind.reason, "unknown_resource_kind");

        let malformed = policy_authorize(
            "DIRECTOR".to_string(),
            "1".to_string(),
            "lead".to_string(),
            "view".to_string(),
            Some("{broken".to_string()),
        );
        assert!(!malformed.allowed);
        assert_eq!(malformed.reason, "invalid_resource");
    }

    #[test]
    fn visible_fields_and_redaction_hide_cost_from_admin() {
        let fields =
            policy_visible_fields("ADMIN".to_string(), "property".to_string(), PROPERTY.to_string());
        assert!(fields.contains(&"address".to_string()));
        assert!(!fields.contains(&"acquisitionCost".to_string()));

        let redacted =
            policy_redact("ADMIN".to_string(), "property".to_string(), PROPERTY.to_string());
        let value: serde_json::Value = serde_json::from_str(&redacted).expect("redacted JSON");
        assert_eq!(value["acquisitionCost"], "Hidden");
    }

    #[test]
    fn director_sees_and_manages_ownerless_records() {
        const OWNERLESS: &str = r#"{"id": 3, "address": "1 Rd", "acquisitionCost": 9}"#;

        let decision = policy_authorize(
            "DIRECTOR".to_string(),
            "1".to_string(),
            "property".to_string(),
            "edit".to_string(),
            Some(OWNERLESS.to_string()),
        );
        assert!(decision.allowed);

        let fields = policy_visible_fields(
            "DIRECTOR".to_string(),
            "property".to_string(),
            OWNERLESS.to_string(),
        );
        assert_eq!(fields, vec!["acquisitionCost", "address", "id"]);

        let redacted =
            policy_redact("DIRECTOR".to_string(), "property".to_string(), OWNERLESS.to_string());
        let value: serde_json::Value = serde_json::from_str(&redacted).expect("redacted JSON");
        assert_eq!(value["acquisitionCost"], 9);

        let user = policy_authorize(
            "USER".to_string(),
            "1".to_string(),
            "property".to_string(),
            "edit".to_string(),
            Some(OWNERLESS.to_string()),
        );
        assert!(!user.allowed);
        assert_eq!(user.reason, "missing_owner");
    }

    #[test]
    fn authorize_uses_kind_of_supplied_record() {
        let decision = policy_authorize(
            "USER".to_string(),
            "7".to_string(),
            "lead".to_string(),
            "delete".to_string(),
            Some(r#"{"id": 7, "userId": 7}"#.to_string()),
        );
        assert!(decision.allowed, "lead record owned by the actor");

        let forged = policy_authorize(
            "USER".to_string(),
            "7".to_string(),
            "lead".to_string(),
            "delete".to_string(),
            None,
        );
        assert!(!forged.allowed);
    }

    #[test]
    fn add_options_map_to_resource_kinds() {
        let items = policy_add_options("USER".to_string());
        let kinds = items.iter().map(|item| item.kind.as_str()).collect::<Vec<_>>();
        assert_eq!(kinds, vec!["lead", "property", "note"]);
        assert!(policy_add_options("DEVELOPER".to_string()).is_empty());
    }

    #[test]
    fn schedule_always_returns_an_identifier() {
        let status = notification_status();
        let identifier = notification_schedule(
            "Follow up".to_string(),
            "Call back".to_string(),
            Some(r#"{"leadId": 1}"#.to_string()),
            true,
            "high".to_string(),
            Some(60),
            None,
        );
        assert!(!identifier.is_empty());
        assert_eq!(
            notification_is_fallback_id(identifier.clone()),
            !status.fully_supported
        );
        notification_cancel(identifier);
    }
}
