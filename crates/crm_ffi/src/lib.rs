//! Flutter bridge over `crm_core`.

pub mod api;
