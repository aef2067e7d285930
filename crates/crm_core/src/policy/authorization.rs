//! Role-based authorization for CRM action affordances.
//!
//! # Responsibility
//! - Decide whether one role may trigger one action on one resource.
//! - Compute which record fields a role may see, and redact the rest.
//!
//! # Invariants
//! - Decisions are pure functions of (role, ownership, action).
//! - Rules are evaluated in fixed precedence; the first matching rule wins.
//! - Unrecognized roles are denied everything.
//!
//! # See also
//! - policy::ownership for owner id resolution.

use crate::model::resource::{Action, OwnerId, Resource, ResourceKind};
use crate::model::role::Role;
use crate::policy::ownership::{is_owner, normalize_actor_id};
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Display value substituted for fields a role may not read.
pub const REDACTED_PLACEHOLDER: &str = "Hidden";

/// One authorization question raised by a UI interaction.
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    pub role: Role,
    /// Session user id, normalized before comparison.
    pub actor_user_id: &'a str,
    /// Kind of the target; ignored when `resource` is present.
    pub kind: ResourceKind,
    /// Existing target; `None` for creation or list-level checks.
    pub resource: Option<&'a Resource>,
    pub action: Action,
}

impl ActionRequest<'_> {
    /// Kind the rules apply to: the resource's own kind when one is given.
    pub fn target_kind(&self) -> ResourceKind {
        self.resource.map_or(self.kind, Resource::kind)
    }
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    DirectorFullAccess,
    AdminManagedAction,
    AdminSensitiveFieldRedacted,
    OwnerMatch,
    OwnerMismatch,
    MissingOwner,
    OwnerlessCreate,
    MissingResource,
    UserManagementForbidden,
    SensitiveFieldForbidden,
    DeveloperDiagnosticView,
    DeveloperActionSuppressed,
    UnrecognizedRole,
}

impl DecisionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectorFullAccess => "director_full_access",
            Self::AdminManagedAction => "admin_managed_action",
            Self::AdminSensitiveFieldRedacted => "admin_sensitive_field_redacted",
            Self::OwnerMatch => "owner_match",
            Self::OwnerMismatch => "owner_mismatch",
            Self::MissingOwner => "missing_owner",
            Self::OwnerlessCreate => "ownerless_create",
            Self::MissingResource => "missing_resource",
            Self::UserManagementForbidden => "user_management_forbidden",
            Self::SensitiveFieldForbidden => "sensitive_field_forbidden",
            Self::DeveloperDiagnosticView => "developer_diagnostic_view",
            Self::DeveloperActionSuppressed => "developer_action_suppressed",
            Self::UnrecognizedRole => "unrecognized_role",
        }
    }
}

/// Allow/deny outcome with its reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    /// Converts a denial into `PolicyDenied` for `?`-style callers.
    pub fn into_result(self) -> Result<(), PolicyDenied> {
        if self.allowed {
            Ok(())
        } else {
            Err(PolicyDenied {
                reason: self.reason,
            })
        }
    }
}

/// Denied authorization, surfaced to the UI as a hidden or disabled affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDenied {
    pub reason: DecisionReason,
}

impl Display for PolicyDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "action denied by policy: {}", self.reason.as_str())
    }
}

impl Error for PolicyDenied {}

/// Stateless role policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleAuthorizationPolicy;

impl RoleAuthorizationPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Decides one action request.
    pub fn authorize(&self, request: &ActionRequest<'_>) -> Decision {
        let decision = match request.role {
            Role::Director => Decision::allow(DecisionReason::DirectorFullAccess),
            Role::Admin => authorize_admin(request.action),
            Role::User => authorize_user(request),
            Role::Developer => authorize_developer(request.action),
            Role::Unrecognized => Decision::deny(DecisionReason::UnrecognizedRole),
        };
        debug!(
            "event=policy_decision module=policy status={} role={} kind={} action={} reason={}",
            if decision.allowed { "allowed" } else { "denied" },
            request.role.as_str(),
            request.target_kind().as_str(),
            request.action.as_str(),
            decision.reason.as_str()
        );
        decision
    }

    /// Returns whether `role` may read the sensitive fields of any resource.
    pub fn can_view_sensitive(&self, role: Role) -> bool {
        matches!(role, Role::Director)
    }

    /// Field names of `resource` that `role` may see.
    pub fn visible_fields(&self, role: Role, resource: &Resource) -> BTreeSet<String> {
        if role == Role::Unrecognized {
            return BTreeSet::new();
        }
        let kind = resource.kind();
        let show_sensitive = self.can_view_sensitive(role);
        resource
            .field_names()
            .filter(|field| show_sensitive || !kind.is_sensitive(field))
            .map(str::to_string)
            .collect()
    }

    /// Copy of the record where hidden sensitive values become the placeholder.
    ///
    /// Unrecognized roles get an empty map.
    pub fn redact(&self, role: Role, resource: &Resource) -> Map<String, Value> {
        if role == Role::Unrecognized {
            return Map::new();
        }
        let kind = resource.kind();
        let show_sensitive = self.can_view_sensitive(role);
        resource
            .record()
            .iter()
            .map(|(field, value)| {
                if !show_sensitive && kind.is_sensitive(field) {
                    (
                        field.clone(),
                        Value::String(REDACTED_PLACEHOLDER.to_string()),
                    )
                } else {
                    (field.clone(), value.clone())
                }
            })
            .collect()
    }
}

fn authorize_admin(action: Action) -> Decision {
    match action {
        Action::ViewSensitiveField => Decision::deny(DecisionReason::AdminSensitiveFieldRedacted),
        Action::View | Action::Create | Action::Edit | Action::Delete => {
            Decision::allow(DecisionReason::AdminManagedAction)
        }
    }
}

fn authorize_user(request: &ActionRequest<'_>) -> Decision {
    let kind = request.target_kind();
    if kind == ResourceKind::User {
        return Decision::deny(DecisionReason::UserManagementForbidden);
    }
    if request.action == Action::ViewSensitiveField {
        return Decision::deny(DecisionReason::SensitiveFieldForbidden);
    }
    if request.action == Action::Create
        && matches!(
            kind,
            ResourceKind::Lead | ResourceKind::Property | ResourceKind::Note
        )
    {
        return Decision::allow(DecisionReason::OwnerlessCreate);
    }

    let Some(resource) = request.resource else {
        return Decision::deny(DecisionReason::MissingResource);
    };
    let Some(owner) = resource.owner_id() else {
        return Decision::deny(DecisionReason::MissingOwner);
    };
    let actor: Option<OwnerId> = normalize_actor_id(request.actor_user_id);
    if is_owner(actor.as_ref(), Some(owner)) {
        Decision::allow(DecisionReason::OwnerMatch)
    } else {
        Decision::deny(DecisionReason::OwnerMismatch)
    }
}

fn authorize_developer(action: Action) -> Decision {
    match action {
        Action::View => Decision::allow(DecisionReason::DeveloperDiagnosticView),
        Action::Create | Action::Edit | Action::Delete | Action::ViewSensitiveField => {
            Decision::deny(DecisionReason::DeveloperActionSuppressed)
        }
    }
}
