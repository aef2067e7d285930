//! Role-based visibility and action authorization.
//!
//! # Responsibility
//! - Gate CRM action affordances and sensitive fields by session role.
//!
//! # Invariants
//! - No side effects, no persisted state, no network calls.

pub mod add_options;
pub mod authorization;
pub mod ownership;
