//! CRM resource model consumed by the authorization policy.
//!
//! # Responsibility
//! - Wrap one backend JSON record together with its kind and resolved owner.
//! - Declare which fields of each kind are sensitive.
//!
//! # Invariants
//! - The owner is resolved once, at construction; records without any owner
//!   alias are valid and carry no owner.
//! - `record` is always a JSON object.

use crate::policy::ownership::resolve_owner_id;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// CRM entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Lead,
    Property,
    /// Notes and calendar events share one backend collection.
    Note,
    CallingTask,
    /// User-management target (creating or editing accounts).
    User,
}

const PROPERTY_SENSITIVE_FIELDS: &[&str] = &["acquisitionCost"];

impl ResourceKind {
    /// Stable wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Property => "property",
            Self::Note => "note",
            Self::CallingTask => "calling_task",
            Self::User => "user",
        }
    }

    /// Parses a wire string; accepts a few UI aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lead" | "leads" => Some(Self::Lead),
            "property" | "properties" => Some(Self::Property),
            "note" | "notes" | "event" => Some(Self::Note),
            "calling_task" | "calling_data" | "callingtask" => Some(Self::CallingTask),
            "user" | "users" => Some(Self::User),
            _ => None,
        }
    }

    /// Fields only a director may read.
    pub fn sensitive_fields(self) -> &'static [&'static str] {
        match self {
            Self::Property => PROPERTY_SENSITIVE_FIELDS,
            Self::Lead | Self::Note | Self::CallingTask | Self::User => &[],
        }
    }

    /// Returns whether `field` belongs to this kind's sensitive set.
    pub fn is_sensitive(self, field: &str) -> bool {
        self.sensitive_fields().contains(&field)
    }
}

/// Action a UI affordance would trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    ViewSensitiveField,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ViewSensitiveField => "view_sensitive_field",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" => Some(Self::View),
            "create" => Some(Self::Create),
            "edit" => Some(Self::Edit),
            "delete" => Some(Self::Delete),
            "view_sensitive_field" | "viewsensitivefield" => Some(Self::ViewSensitiveField),
            _ => None,
        }
    }

    /// Create/edit/delete change backend state.
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Create | Self::Edit | Self::Delete)
    }
}

/// Normalized owner identifier.
///
/// Ids arrive as JSON strings or numbers; both normalize to the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One backend record with its resolved owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    kind: ResourceKind,
    owner_id: Option<OwnerId>,
    record: Map<String, Value>,
}

impl Resource {
    /// Builds a resource from a backend JSON record.
    ///
    /// # Errors
    /// - `NotAnObject` when `record` is not a JSON object.
    pub fn from_record(kind: ResourceKind, record: Value) -> Result<Self, ResourceError> {
        let Value::Object(record) = record else {
            return Err(ResourceError::NotAnObject(kind));
        };
        let owner_id = resolve_owner_id(&record);
        Ok(Self {
            kind,
            owner_id,
            record,
        })
    }

    /// Parses a JSON text record, then delegates to [`Resource::from_record`].
    pub fn from_json_str(kind: ResourceKind, raw: &str) -> Result<Self, ResourceError> {
        let value = serde_json::from_str::<Value>(raw)
            .map_err(|err| ResourceError::InvalidJson(err.to_string()))?;
        Self::from_record(kind, value)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Resolved owner; `None` when no owner alias carries a usable id.
    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Top-level field names in record order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.record.keys().map(String::as_str)
    }
}

/// Resource construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    InvalidJson(String),
    NotAnObject(ResourceKind),
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "resource record is not valid JSON: {message}"),
            Self::NotAnObject(kind) => {
                write!(f, "{} record must be a JSON object", kind.as_str())
            }
        }
    }
}

impl Error for ResourceError {}
