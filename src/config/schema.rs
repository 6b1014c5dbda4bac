//! Configuration schema definitions.
//!
//! Every section is defaulted so a minimal file (or no file at all) yields a
//! working server with an empty role table.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::rbac::RoleSpec;
use crate::routing::RouterSettings;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub listener: ListenerConfig,

    /// Context keys and parameter marker used by the dispatcher.
    pub routing: RouterSettings,

    pub rbac: RbacConfig,

    /// Role name to role specifier.
    pub roles: BTreeMap<String, RoleSpec>,

    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on one request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Role registry behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Compile every role at startup instead of on first use.
    pub prebuild: bool,

    /// Reload `[roles]` when the file changes.
    pub watch: bool,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            prebuild: true,
            watch: false,
        }
    }
}

/// Logging and metrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,

    pub json_logs: bool,

    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "rbac_router=debug,tower_http=debug".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
