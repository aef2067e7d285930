//! Process configuration from environment variables.
//!
//! # Responsibility
//! - Resolve backend URL, log level and host attributes at startup.
//! - Derive the development backend URL from the bundler host.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set-but-invalid values are errors.
//! - Backend hosts may be DNS names or dotted-quad IPv4 addresses.

use crate::logging::default_log_level;
use log::LevelFilter;
use crate::notification::capability::{HostEnvironment, HostOwnership};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ENV_API_BASE_URL: &str = "CRM_API_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "CRM_LOG_LEVEL";
pub const ENV_HOST_OWNERSHIP: &str = "CRM_HOST_OWNERSHIP";
pub const ENV_RELEASE_BUILD: &str = "CRM_RELEASE_BUILD";

pub const DEFAULT_API_BASE_URL: &str = "https://api.fieldcrm.app/api";

static IPV4_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])(\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])){3}$",
    )
    .expect("static IPv4 pattern is valid")
});

static DNS_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$")
        .expect("static hostname pattern is valid")
});

static BASE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)https?://(?P<host>[^/:\s]+)(:(?P<port>[0-9]{1,5}))?(/\S*)?$")
        .expect("static base url pattern is valid")
});

/// Resolved startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub log_level: &'static str,
    pub host: HostEnvironment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_level: default_log_level(),
            host: HostEnvironment {
                ownership: HostOwnership::SelfHosted,
                release_build: !cfg!(debug_assertions),
            },
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; used by tests and embedders.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_base_url = match read(ENV_API_BASE_URL) {
            Some(raw) => validate_base_url(&raw)?,
            None => defaults.api_base_url,
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(raw) => parse_level(&raw)?,
            None => defaults.log_level,
        };

        let ownership = match read(ENV_HOST_OWNERSHIP) {
            Some(raw) => HostOwnership::parse(&raw).ok_or(ConfigError::InvalidValue {
                key: ENV_HOST_OWNERSHIP,
                value: raw,
            })?,
            None => defaults.host.ownership,
        };

        let release_build = match read(ENV_RELEASE_BUILD) {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                key: ENV_RELEASE_BUILD,
                value: raw,
            })?,
            None => defaults.host.release_build,
        };

        Ok(Self {
            api_base_url,
            log_level,
            host: HostEnvironment {
                ownership,
                release_build,
            },
        })
    }
}

/// Returns whether `host` is a dotted-quad IPv4 address or a DNS hostname.
pub fn is_valid_host(host: &str) -> bool {
    let host = host.trim();
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    IPV4_HOST.is_match(host) || (DNS_HOST.is_match(host) && !looks_numeric(host))
}

/// Builds the development backend URL from a bundler host URI such as
/// `192.168.1.20:8081` or `devbox.local:8081`.
pub fn resolve_dev_api_base_url(host_uri: &str, api_port: u16) -> Result<String, ConfigError> {
    let trimmed = host_uri.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);
    let host = without_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    if !is_valid_host(host) {
        return Err(ConfigError::InvalidHost(host_uri.to_string()));
    }
    Ok(format!("http://{host}:{api_port}/api"))
}

fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let captures = BASE_URL
        .captures(raw)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: ENV_API_BASE_URL,
            value: raw.to_string(),
        })?;
    let host = captures.name("host").map_or("", |m| m.as_str());
    if !is_valid_host(host) {
        return Err(ConfigError::InvalidHost(host.to_string()));
    }
    if let Some(port) = captures.name("port") {
        if port.as_str().parse::<u16>().is_err() {
            return Err(ConfigError::InvalidValue {
                key: ENV_API_BASE_URL,
                value: raw.to_string(),
            });
        }
    }
    Ok(raw.trim_end_matches('/').to_string())
}

// "999.1.1.1" passes the hostname grammar; numeric-only labels are IPv4 attempts.
fn looks_numeric(host: &str) -> bool {
    host.split('.')
        .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_digit()))
}

/// Maps a level name (case-insensitive, `warning` allowed) to the filter
/// string the file logger accepts. `off` is not a valid level.
pub fn parse_log_level(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    let filter = if raw.eq_ignore_ascii_case("warning") {
        LevelFilter::Warn
    } else {
        raw.parse::<LevelFilter>().ok()?
    };
    match filter {
        LevelFilter::Off => None,
        LevelFilter::Error => Some("error"),
        LevelFilter::Warn => Some("warn"),
        LevelFilter::Info => Some("info"),
        LevelFilter::Debug => Some("debug"),
        LevelFilter::Trace => Some("trace"),
    }
}

fn parse_level(raw: &str) -> Result<&'static str, ConfigError> {
    parse_log_level(raw).ok_or_else(|| ConfigError::InvalidValue {
        key: ENV_LOG_LEVEL,
        value: raw.to_string(),
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    InvalidHost(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: `{value}`"),
            Self::InvalidHost(value) => write!(f, "backend host is invalid: `{value}`"),
        }
    }
}

impl Error for ConfigError {}
