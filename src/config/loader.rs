//! Configuration loading from disk and environment.
//!
//! A TOML file is optional. Environment variables are applied on top of the
//! file (or the defaults) so the proxy can be deployed the way the edge
//! worker was: configured entirely through its environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ProxyConfig, RouteConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {reason}")]
    Env { name: &'static str, reason: String },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file plus the process environment,
/// then validate it.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` returns the raw value of a variable, if set.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string());

    if let Some(addr) = get("PROXY_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }

    // BACKEND_HOST wins over BACKEND_IP when both are set.
    if let Some(ip) = get("BACKEND_IP") {
        config.upstream.address = ip;
    }
    if let Some(host) = get("BACKEND_HOST") {
        config.upstream.address = host;
    }
    if let Some(scheme) = get("BACKEND_SCHEME") {
        config.upstream.scheme = scheme.to_ascii_lowercase();
    }
    if let Some(host_header) = get("BACKEND_HOST_HEADER") {
        config.upstream.host_header = Some(host_header).filter(|h| !h.is_empty());
    }
    if let Some(suffix) = get("BACKEND_IP_HOST_SUFFIX") {
        config.upstream.ip_host_suffix = suffix;
    }

    if let Some(routes) = get("PROXY_ROUTES") {
        config.routes = parse_routes(&routes)?;
    } else if let Some(port) = get("CHATBOT_PORT") {
        let port = parse_port("CHATBOT_PORT", &port)?;
        match config.routes.iter_mut().find(|r| r.prefix == "/chatbot") {
            Some(route) => route.port = port,
            None => config.routes.push(RouteConfig::new("/chatbot", port)),
        }
    }

    if let Some(origins) = get("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = split_list(&origins).map(str::to_string).collect();
    }
    if let Some(origin) = get("DEFAULT_ORIGIN") {
        config.cors.default_origin = origin;
    }

    if let Some(secs) = get("UPSTREAM_TIMEOUT_SECS") {
        config.timeouts.upstream_secs = parse_secs("UPSTREAM_TIMEOUT_SECS", &secs)?;
    }
    if let Some(secs) = get("UPSTREAM_IDLE_SECS") {
        config.timeouts.idle_secs = parse_secs("UPSTREAM_IDLE_SECS", &secs)?;
    }
    if let Some(trust) = get("TRUST_CLIENT_IP_HEADER") {
        config.edge.trust_client_ip_header = parse_bool("TRUST_CLIENT_IP_HEADER", &trust)?;
    }

    if let Some(name) = get("PROXY_WORKER_NAME") {
        config.discovery.worker_name = name;
    }
    if let Some(enabled) = get("DISCOVERY_ENABLED") {
        config.discovery.enabled = parse_bool("DISCOVERY_ENABLED", &enabled)?;
    }

    Ok(())
}

/// Parse `"/chatbot=8000,/api=9000"` into an ordered route table.
fn parse_routes(raw: &str) -> Result<Vec<RouteConfig>, ConfigError> {
    split_list(raw)
        .map(|entry| {
            let (prefix, port) = entry.split_once('=').ok_or_else(|| ConfigError::Env {
                name: "PROXY_ROUTES",
                reason: format!("entry {entry:?} is not of the form /prefix=port"),
            })?;
            Ok(RouteConfig::new(prefix.trim(), parse_port("PROXY_ROUTES", port.trim())?))
        })
        .collect()
}

fn parse_port(name: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Env {
        name,
        reason: format!("port {raw:?}: {e}"),
    })
}

fn parse_secs(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Env {
        name,
        reason: format!("{e}"),
    })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Env {
            name,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}
