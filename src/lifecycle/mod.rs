//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGTERM/SIGINT (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → HTTP server drains and stops
//!     → role reload loop exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
