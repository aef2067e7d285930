//! Runtime mode detection for notification availability.
//!
//! # Responsibility
//! - Classify the host process into one of three runtime modes.
//! - Combine the mode with platform initialization into a capability snapshot.
//!
//! # Invariants
//! - `notifications_available` is true iff mode is not `SandboxedHost` and
//!   platform initialization succeeded.
//! - A sandboxed host never touches the platform provider.

use crate::notification::platform::NotificationPlatform;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Who owns the host binary the app runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostOwnership {
    /// Generic pre-built container app shared by many projects.
    Sandbox,
    /// Custom-compiled client built for this app.
    SelfHosted,
}

impl HostOwnership {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "expo" | "container" => Some(Self::Sandbox),
            "self_hosted" | "standalone" | "bare" | "native" => Some(Self::SelfHosted),
            _ => None,
        }
    }
}

/// Host attributes reported at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnvironment {
    pub ownership: HostOwnership,
    /// Signed release build.
    pub release_build: bool,
}

/// Mutually exclusive runtime modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    SandboxedHost,
    NativeDevelopmentBuild,
    NativeProductionBuild,
}

impl RuntimeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SandboxedHost => "sandboxed_host",
            Self::NativeDevelopmentBuild => "native_development_build",
            Self::NativeProductionBuild => "native_production_build",
        }
    }
}

/// Capability snapshot cached for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeCapability {
    pub mode: RuntimeMode,
    pub notifications_available: bool,
}

/// Pure mode classification.
pub fn detect_mode(env: &HostEnvironment) -> RuntimeMode {
    match (env.ownership, env.release_build) {
        (HostOwnership::Sandbox, _) => RuntimeMode::SandboxedHost,
        (HostOwnership::SelfHosted, false) => RuntimeMode::NativeDevelopmentBuild,
        (HostOwnership::SelfHosted, true) => RuntimeMode::NativeProductionBuild,
    }
}

/// Detects the mode, then initializes `platform` unless sandboxed.
pub fn detect_capability(
    env: &HostEnvironment,
    platform: &dyn NotificationPlatform,
) -> RuntimeCapability {
    let mode = detect_mode(env);
    let notifications_available = match mode {
        RuntimeMode::SandboxedHost => {
            info!(
                "event=capability_detect module=notification status=degraded mode={} reason=sandboxed_host",
                mode.as_str()
            );
            false
        }
        RuntimeMode::NativeDevelopmentBuild | RuntimeMode::NativeProductionBuild => {
            match platform.initialize() {
                Ok(()) => {
                    info!(
                        "event=capability_detect module=notification status=ok mode={}",
                        mode.as_str()
                    );
                    true
                }
                Err(err) => {
                    warn!(
                        "event=capability_detect module=notification status=degraded mode={} error={}",
                        mode.as_str(),
                        err
                    );
                    false
                }
            }
        }
    };

    RuntimeCapability {
        mode,
        notifications_available,
    }
}
