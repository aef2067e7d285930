//! Notification availability across runtime environments.
//!
//! # Responsibility
//! - Detect whether notifications can work in this host.
//! - Route scheduling through a provider chosen once at startup.
//!
//! # Invariants
//! - Mode is fixed for the process lifetime except for explicit re-probes.

pub mod capability;
pub mod platform;
pub mod request;
pub mod service;
