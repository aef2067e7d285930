//! CRM domain model shared by policy and UI bridge.
//!
//! # Responsibility
//! - Define roles, actions and resource wrappers used by authorization.
//!
//! # Invariants
//! - Every `Resource` carries exactly one resolved owner id.

pub mod resource;
pub mod role;
