//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registration, role compilation and dispatch produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric calls are no-ops until a recorder is installed, so library users
//!   and tests pay nothing
//! - Log filtering follows `RUST_LOG` first, then the configured filter

pub mod logging;
pub mod metrics;
