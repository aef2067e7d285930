//! Composition root for the CRM core.
//!
//! # Responsibility
//! - Build the policy and notification components once, from config.
//! - Hand them to call sites by reference instead of global accessors.

use crate::config::AppConfig;
use crate::notification::platform::{NotificationPlatform, QueuedPlatform};
use crate::notification::service::NotificationService;
use crate::policy::authorization::RoleAuthorizationPolicy;
use log::info;
use std::sync::Arc;

/// Application-wide components. The two parts never call each other.
pub struct CrmCore {
    config: AppConfig,
    policy: RoleAuthorizationPolicy,
    notifications: NotificationService,
}

impl CrmCore {
    /// Wires the core with the in-process notification queue.
    pub fn new(config: AppConfig) -> Self {
        Self::with_platform(config, Arc::new(QueuedPlatform::new()))
    }

    /// Wires the core with a caller-provided notification provider.
    pub fn with_platform(config: AppConfig, platform: Arc<dyn NotificationPlatform>) -> Self {
        let notifications = NotificationService::start(config.host, platform);
        let capability = notifications.capability();
        info!(
            "event=core_start module=core status=ok mode={} notifications_available={}",
            capability.mode.as_str(),
            capability.notifications_available
        );
        Self {
            config,
            policy: RoleAuthorizationPolicy::new(),
            notifications,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn policy(&self) -> &RoleAuthorizationPolicy {
        &self.policy
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }
}
