//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (setup phase):
//!     "[METHOD ]path" + handlers
//!     → mapping.rs (parse, split, classify segments)
//!     → router.rs (walk tries, crossing mounted routers)
//!     → trie.rs (create nodes, check parameter names)
//!
//! Dispatch (per request):
//!     RequestContext
//!     → dispatcher.rs (lookup, fallbacks, authorization)
//!     → handler.rs (preamble ++ handlers driven through Next)
//! ```
//!
//! # Design Decisions
//! - Route tables are built before serving; options may change at runtime
//! - Static segments are case-insensitive, captured values are not
//! - A handler that does not run its continuation ends the chain

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod mapping;
pub mod options;
pub mod router;
pub mod trie;

pub use context::{RequestContext, RouteAction, RouteParams};
pub use dispatcher::Dispatcher;
pub use error::{BoxError, DispatchError, RouteError};
pub use handler::{
    fetcher_fn, handler_fn, BoxFuture, Handler, HandlerResult, HeaderRoles, IntoHandlers, Next,
    RoleFetcher, SharedHandler, StaticRoles,
};
pub use mapping::{parse_mapping, Mapping, RouteSpec, ANY_METHOD};
pub use options::{RouterOptions, RouterSettings};
pub use router::{Mount, RouterId, RouterMut};
pub use trie::RouteDescriptor;
