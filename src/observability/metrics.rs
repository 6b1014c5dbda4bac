//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatches by `outcome`
//!   (matched, middleware, not_found, no_method, forbidden)
//! - `router_authorization_total` (counter): permission checks by `result`
//! - `rbac_role_compilations_total` (counter): roles compiled or recompiled

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

fn describe() {
    describe_counter!("router_dispatch_total", "Dispatched requests by outcome");
    describe_counter!("router_authorization_total", "Permission checks by result");
    describe_counter!("rbac_role_compilations_total", "Role compilations");
}

pub fn record_dispatch(outcome: &'static str) {
    counter!("router_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_authorization(granted: bool) {
    let result = if granted { "granted" } else { "denied" };
    counter!("router_authorization_total", "result" => result).increment(1);
}

pub fn record_role_compilation() {
    counter!("rbac_role_compilations_total").increment(1);
}
