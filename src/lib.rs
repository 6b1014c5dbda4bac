//! Request routing with role-based authorization.
//!
//! A [`Dispatcher`] owns a tree of routers. Routes map `[METHOD ]path`
//! patterns to handler chains; named routes are only reachable for callers
//! whose roles grant the route's name as a permission. Roles are compiled
//! from a small specification language by [`rbac::RoleRegistry`].

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rbac;
pub mod routing;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rbac::{RoleRegistry, RoleSpec, SharedRoles};
pub use routing::{Dispatcher, Mount, RequestContext, RouterOptions, RouterSettings};
