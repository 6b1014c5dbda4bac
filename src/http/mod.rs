//! HTTP transport.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, trace + timeout layers)
//!     → adapter.rs (request → RequestContext)
//!     → Dispatcher::dispatch
//!     → adapter.rs (status/body or DispatchError → response)
//! ```

pub mod adapter;
pub mod server;

pub use adapter::into_axum;
pub use server::HttpServer;
