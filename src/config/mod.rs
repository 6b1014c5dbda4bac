//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated)
//!
//! When [rbac] watch = true:
//!     watcher.rs detects change
//!     → loader.rs loads and validates the file again
//!     → [roles] table sent over mpsc
//!     → reload_roles (fresh RoleRegistry, swapped in on success)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Only the role table is reloaded; routes are code, not configuration

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, ListenerConfig, ObservabilityConfig, RbacConfig};
pub use validation::ValidationError;
pub use watcher::{reload_roles, RoleTable, RoleWatcher};
