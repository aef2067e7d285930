//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `crm_core` linkage and show what the core detects on this host.
//!
//! Usage: `crm_cli [ROLE]` (default `USER`). Reads the same `CRM_*`
//! environment variables as the app.

use crm_core::{add_options, AppConfig, CrmCore, Role};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("crm_core ping={}", crm_core::ping());
    println!("crm_core version={}", crm_core::core_version());

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("api_base_url={}", config.api_base_url);

    let core = CrmCore::new(config);
    let capability = core.notifications().capability();
    println!(
        "runtime_mode={} notifications_available={}",
        capability.mode.as_str(),
        capability.notifications_available
    );

    let raw_role = std::env::args().nth(1).unwrap_or_else(|| "USER".to_string());
    let role = Role::from_session(&raw_role);
    let labels = add_options(role)
        .iter()
        .map(|option| option.label)
        .collect::<Vec<_>>();
    println!("role={} add_options=[{}]", role.as_str(), labels.join(", "));
    ExitCode::SUCCESS
}
