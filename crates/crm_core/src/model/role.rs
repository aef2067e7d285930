//! Session role model.
//!
//! # Responsibility
//! - Map the role string resolved by the session layer to a closed enum.
//!
//! # Invariants
//! - Role is assigned at login and never changes for the process lifetime.
//! - Unknown role strings never widen access: they map to `Unrecognized`.

use serde::{Deserialize, Serialize};

/// Role held in session state after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
    Director,
    Developer,
    /// Any value the session layer produced that is not a known role.
    #[serde(other)]
    Unrecognized,
}

impl Role {
    /// Normalizes a raw session role string.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    pub fn from_session(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Self::Admin,
            "USER" => Self::User,
            "DIRECTOR" => Self::Director,
            "DEVELOPER" => Self::Developer,
            _ => Self::Unrecognized,
        }
    }

    /// Stable wire string, as the backend sends it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
            Self::Director => "DIRECTOR",
            Self::Developer => "DEVELOPER",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn from_session_normalizes_case_and_whitespace() {
        assert_eq!(Role::from_session(" director "), Role::Director);
        assert_eq!(Role::from_session("Admin"), Role::Admin);
        assert_eq!(Role::from_session("USER"), Role::User);
        assert_eq!(Role::from_session("developer"), Role::Developer);
    }

    #[test]
    fn unknown_values_fail_closed() {
        assert_eq!(Role::from_session(""), Role::Unrecognized);
        assert_eq!(Role::from_session("SUPERUSER"), Role::Unrecognized);
    }

    #[test]
    fn deserializes_unknown_role_as_unrecognized() {
        let role: Role = serde_json::from_str("\"MANAGER\"").expect("role should deserialize");
        assert_eq!(role, Role::Unrecognized);
        let role: Role = serde_json::from_str("\"DIRECTOR\"").expect("role should deserialize");
        assert_eq!(role, Role::Director);
    }
}
