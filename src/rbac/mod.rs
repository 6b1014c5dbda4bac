//! Role-based access control.
//!
//! # Data Flow
//! ```text
//! role specifications (config file, code)
//!     → spec.rs (normalize to tokens)
//!     → compiler.rs (fold tokens, resolve @role references, record dependents)
//!     → RoleRegistry (name → permission set)
//!
//! Dispatch time:
//!     role specifier from the request
//!     → matcher.rs (any listed role grants the action, or `*`)
//! ```
//!
//! # Design Decisions
//! - A registry is an explicit value, owned by its user; there is no global
//!   role table
//! - Changing a role recompiles everything that depends on it
//! - Circular references are a compile error

pub mod compiler;
pub mod error;
pub mod matcher;
pub mod spec;

pub use compiler::{PermissionSet, RoleRegistry};
pub use error::{CompileFailure, RbacError};
pub use matcher::{match_shared, SharedRoles};
pub use spec::{RoleSpec, Token, WILDCARD};
