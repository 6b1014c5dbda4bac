//! rbac-router server.
//!
//! Serves an introspection API over the configured role table:
//!
//! ```text
//! GET /health          unnamed, always allowed
//! GET /roles           roles.list
//! GET /roles/:name     roles.read
//! ```
//!
//! The caller's roles are read from the `x-roles` header. Clients choose
//! that header freely, so this server is a demo of the routing and role
//! machinery, not an access boundary: put it behind a proxy that
//! authenticates callers and sets `x-roles`, or replace [`HeaderRoles`] with
//! a fetcher backed by real credentials.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use rbac_router::config::{load_config, reload_roles, AppConfig, RoleWatcher};
use rbac_router::lifecycle::signals::trigger_on_signal;
use rbac_router::observability::{logging, metrics};
use rbac_router::rbac::RbacError;
use rbac_router::routing::{handler_fn, DispatchError, HeaderRoles, RouteError, SharedHandler};
use rbac_router::{Dispatcher, HttpServer, Mount, RoleRegistry, RouterOptions, SharedRoles, Shutdown};

const ROLES_HEADER: &str = "x-roles";

#[derive(Parser)]
#[command(name = "rbac-router", version)]
#[command(about = "Role-gated request router", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability.log_filter, config.observability.json_logs);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rbac-router starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let roles: SharedRoles = Arc::new(RwLock::new(RoleRegistry::new()));
    roles
        .write()
        .expect("role registry lock poisoned")
        .setup(config.roles.clone(), config.rbac.prebuild)?;

    let dispatcher = build_dispatcher(&config, roles.clone())?;
    tracing::info!(actions = ?dispatcher.actions(), "Routes registered");

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(trigger_on_signal(shutdown.clone()));

    // dropping the watcher stops it
    let _watcher = match (&args.config, config.rbac.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = RoleWatcher::new(path);
            let watcher = watcher.run()?;
            let roles = roles.clone();
            let prebuild = config.rbac.prebuild;
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(table) = updates.recv() => {
                            if let Err(e) = reload_roles(&roles, table, prebuild) {
                                tracing::error!(error = %e, "Role reload failed, keeping current roles");
                            }
                        }
                        _ = stop.recv() => break,
                    }
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(
        Arc::new(dispatcher),
        Duration::from_secs(config.listener.request_timeout_secs),
    );
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_dispatcher(config: &AppConfig, roles: SharedRoles) -> Result<Dispatcher, RouteError> {
    let options = RouterOptions::new().with_role_fetcher(Arc::new(HeaderRoles(ROLES_HEADER.to_string())));
    let mut dispatcher = Dispatcher::with_settings(options, config.routing.clone(), roles.clone());

    let marker = config.routing.param_marker;
    let introspection = dispatcher.create_router(RouterOptions::default());
    dispatcher
        .router(introspection)?
        .get_named("roles.list", "/", list_roles(roles.clone()))?
        .get_named("roles.read", &format!("/{}name", marker), read_role(roles))?;

    dispatcher
        .root()
        .get("/health", health())?
        .mount("/roles", Mount::Router(introspection))?;
    Ok(dispatcher)
}

fn health() -> SharedHandler {
    handler_fn(|ctx, _next| {
        Box::pin(async move {
            ctx.body = Some(json!({ "status": "ok" }));
            Ok(())
        })
    })
}

fn list_roles(roles: SharedRoles) -> SharedHandler {
    handler_fn(move |ctx, _next| {
        let names = roles.read().expect("role registry lock poisoned").role_names();
        Box::pin(async move {
            ctx.body = Some(json!({ "roles": names }));
            Ok(())
        })
    })
}

fn read_role(roles: SharedRoles) -> SharedHandler {
    handler_fn(move |ctx, _next| {
        let roles = roles.clone();
        Box::pin(async move {
            let name = ctx.param("name").unwrap_or_default().to_string();
            let permissions = resolved(&roles, &name)
                .map_err(|e| DispatchError::status(404, e.to_string()))?;
            ctx.body = Some(json!({ "role": name, "permissions": permissions }));
            Ok(())
        })
    })
}

fn resolved(roles: &SharedRoles, name: &str) -> Result<Vec<String>, RbacError> {
    let mut guard = roles.write().expect("role registry lock poisoned");
    let mut permissions: Vec<String> = guard.resolve(name)?.iter().cloned().collect();
    permissions.sort();
    Ok(permissions)
}
