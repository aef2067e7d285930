//! Core business rules for the CRM mobile client.
//! UI code asks this crate what a role may do and how to notify; it never
//! decides either on its own.

pub mod app;
pub mod config;
pub mod logging;
pub mod model;
pub mod notification;
pub mod policy;

pub use app::CrmCore;
pub use config::{resolve_dev_api_base_url, AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::resource::{Action, OwnerId, Resource, ResourceError, ResourceKind};
pub use model::role::Role;
pub use notification::capability::{
    detect_capability, detect_mode, HostEnvironment, HostOwnership, RuntimeCapability,
    RuntimeMode,
};
pub use notification::platform::{
    DisabledPlatform, NotificationPlatform, PlatformError, QueuedPlatform,
};
pub use notification::request::{NotificationRequest, Priority, ScheduledNotification, Trigger};
pub use notification::service::{
    is_fallback_identifier, NotificationError, NotificationService, FALLBACK_ID_PREFIX,
};
pub use policy::add_options::{add_options, AddOption, AddOptionKind};
pub use policy::authorization::{
    ActionRequest, Decision, DecisionReason, PolicyDenied, RoleAuthorizationPolicy,
    REDACTED_PLACEHOLDER,
};
pub use policy::ownership::resolve_owner_id;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
