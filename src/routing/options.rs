//! Router options and the inherited configuration chain.
//!
//! Options are not copied when a router is mounted. The effective options of
//! a router are merged from its outermost ancestor down to itself on every
//! dispatch, so replacing an ancestor's options later is still seen by its
//! descendants.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::routing::handler::{IntoHandlers, RoleFetcher, SharedHandler};

/// Per-router options. Unset fields inherit from the parent router.
#[derive(Clone, Default)]
pub struct RouterOptions {
    /// Supplies the caller's role specifier for named routes.
    pub role_fetcher: Option<Arc<dyn RoleFetcher>>,
    /// Runs instead of the chain when authorization is denied.
    pub prohibition_handler: Option<SharedHandler>,
    /// Prepended to every matched chain.
    pub preamble: Option<Vec<SharedHandler>>,
    pub not_found_handler: Option<SharedHandler>,
    /// Falls back to the not-found handler when unset.
    pub no_method_handler: Option<SharedHandler>,
    /// Opaque application-level options.
    pub extra: Map<String, Value>,
}

impl RouterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role_fetcher(mut self, fetcher: Arc<dyn RoleFetcher>) -> Self {
        self.role_fetcher = Some(fetcher);
        self
    }

    pub fn with_prohibition_handler(mut self, handler: SharedHandler) -> Self {
        self.prohibition_handler = Some(handler);
        self
    }

    pub fn with_preamble(mut self, handlers: impl IntoHandlers) -> Self {
        self.preamble = Some(handlers.into_handlers());
        self
    }

    pub fn with_not_found_handler(mut self, handler: SharedHandler) -> Self {
        self.not_found_handler = Some(handler);
        self
    }

    pub fn with_no_method_handler(mut self, handler: SharedHandler) -> Self {
        self.no_method_handler = Some(handler);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Opaque option `key`.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Overlay `child` on top of `self`: every option the child sets wins.
    pub fn merge(&mut self, child: &RouterOptions) {
        if child.role_fetcher.is_some() {
            self.role_fetcher = child.role_fetcher.clone();
        }
        if child.prohibition_handler.is_some() {
            self.prohibition_handler = child.prohibition_handler.clone();
        }
        if child.preamble.is_some() {
            self.preamble = child.preamble.clone();
        }
        if child.not_found_handler.is_some() {
            self.not_found_handler = child.not_found_handler.clone();
        }
        if child.no_method_handler.is_some() {
            self.no_method_handler = child.no_method_handler.clone();
        }
        for (key, value) in &child.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("role_fetcher", &self.role_fetcher.is_some())
            .field("prohibition_handler", &self.prohibition_handler.is_some())
            .field("preamble", &self.preamble.as_ref().map(Vec::len))
            .field("not_found_handler", &self.not_found_handler.is_some())
            .field("no_method_handler", &self.no_method_handler.is_some())
            .field("extra", &self.extra)
            .finish()
    }
}

/// Dispatcher-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Context attribute receiving the matched action name.
    pub action_key: String,
    /// Context attribute receiving the captured parameters.
    pub params_key: String,
    /// Leading character of parametric path segments.
    pub param_marker: char,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            action_key: "action".to_string(),
            params_key: "params".to_string(),
            param_marker: ':',
        }
    }
}
