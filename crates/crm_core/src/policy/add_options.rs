//! Quick-add menu options per role.

use crate::model::resource::ResourceKind;
use crate::model::role::Role;

/// Entry kind in the quick-add menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddOptionKind {
    User,
    Lead,
    Properties,
    Notes,
    CallingData,
}

impl AddOptionKind {
    /// Resource created when the option is picked.
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Self::User => ResourceKind::User,
            Self::Lead => ResourceKind::Lead,
            Self::Properties => ResourceKind::Property,
            Self::Notes => ResourceKind::Note,
            Self::CallingData => ResourceKind::CallingTask,
        }
    }
}

/// One labeled quick-add entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOption {
    pub kind: AddOptionKind,
    pub label: &'static str,
}

const fn option(kind: AddOptionKind, label: &'static str) -> AddOption {
    AddOption { kind, label }
}

const ADMIN_OPTIONS: &[AddOption] = &[
    option(AddOptionKind::User, "User"),
    option(AddOptionKind::Lead, "Lead"),
    option(AddOptionKind::Properties, "Properties"),
    option(AddOptionKind::Notes, "Notes"),
    option(AddOptionKind::CallingData, "CallingData"),
];

// Directors create admins through the same entry.
const DIRECTOR_OPTIONS: &[AddOption] = &[
    option(AddOptionKind::User, "User (Admin)"),
    option(AddOptionKind::Lead, "Lead"),
    option(AddOptionKind::Properties, "Properties"),
    option(AddOptionKind::Notes, "Notes"),
    option(AddOptionKind::CallingData, "CallingData"),
];

const USER_OPTIONS: &[AddOption] = &[
    option(AddOptionKind::Lead, "Lead"),
    option(AddOptionKind::Properties, "Properties"),
    option(AddOptionKind::Notes, "Notes"),
];

/// Ordered quick-add options for `role`.
///
/// An empty list means no quick-add menu; the UI falls back to its default
/// single action.
pub fn add_options(role: Role) -> Vec<AddOption> {
    match role {
        Role::Admin => ADMIN_OPTIONS.to_vec(),
        Role::Director => DIRECTOR_OPTIONS.to_vec(),
        Role::User => USER_OPTIONS.to_vec(),
        Role::Developer | Role::Unrecognized => Vec::new(),
    }
}
