//! Permission matching against compiled roles.

use std::sync::{Arc, RwLock};

use crate::rbac::compiler::{PermissionSet, RoleRegistry};
use crate::rbac::error::RbacError;
use crate::rbac::spec::{RoleSpec, WILDCARD};

/// Role registry shared between the dispatcher and whoever maintains roles.
pub type SharedRoles = Arc<RwLock<RoleRegistry>>;

fn grants(perms: &PermissionSet, permission: &str) -> bool {
    perms.contains(permission) || perms.contains(WILDCARD)
}

impl RoleRegistry {
    /// True if any role named by `roles` grants `permission` (or `*`).
    ///
    /// Unknown role names grant nothing. Uncompiled roles are compiled on
    /// demand, which is why this needs `&mut self`.
    pub fn matches(&mut self, permission: &str, roles: &RoleSpec) -> Result<bool, RbacError> {
        for name in roles.tokens() {
            if grants(self.resolve(&name)?, permission) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Lock-aware variant of [`RoleRegistry::matches`].
///
/// Answers under the read lock when every listed role is compiled or unknown
/// and only takes the write lock when something must be compiled first.
pub fn match_shared(
    registry: &RwLock<RoleRegistry>,
    permission: &str,
    roles: &RoleSpec,
) -> Result<bool, RbacError> {
    let names = roles.tokens();
    {
        let guard = registry.read().expect("role registry lock poisoned");
        let ready = names
            .iter()
            .all(|name| !guard.contains(name) || guard.is_compiled(name));
        if ready {
            return Ok(names
                .iter()
                .filter_map(|name| guard.permissions(name))
                .any(|perms| grants(perms, permission)));
        }
    }
    let mut guard = registry.write().expect("role registry lock poisoned");
    guard.matches(permission, roles)
}
