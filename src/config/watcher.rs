//! Role file watcher for hot reload.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::rbac::{RbacError, RoleRegistry, RoleSpec, SharedRoles};

/// Role table as loaded from `[roles]`.
pub type RoleTable = BTreeMap<String, RoleSpec>;

/// Watches the configuration file and publishes its role table on change.
pub struct RoleWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RoleTable>,
}

impl RoleWatcher {
    /// Returns the watcher and a receiver for role table updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RoleTable>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(config) => {
                            tracing::info!(roles = config.roles.len(), "Role file changed");
                            let _ = tx.send(config.roles);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload roles, keeping current table");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Role watcher started");
        Ok(watcher)
    }
}

/// Replace the shared role registry with one built from `table`.
///
/// The new registry is set up before the write lock is taken and only swapped
/// in on success; on error the current roles keep answering unchanged.
pub fn reload_roles(shared: &SharedRoles, table: RoleTable, prebuild: bool) -> Result<(), RbacError> {
    let mut fresh = RoleRegistry::new();
    fresh.setup(table, prebuild)?;
    let roles = fresh.role_names().len();
    *shared.write().expect("role registry lock poisoned") = fresh;
    tracing::info!(roles, "Roles reloaded");
    Ok(())
}
