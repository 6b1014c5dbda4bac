//! Route mapping strings and path segmentation.
//!
//! A mapping is `[METHOD ]path`. Without a method the route answers any
//! verb. Paths split on runs of `/`; a segment starting with the parameter
//! marker captures the request segment under the marker-stripped name.

use crate::routing::error::RouteError;
use crate::routing::handler::{IntoHandlers, SharedHandler};

/// Method key of routes registered without a verb.
pub const ANY_METHOD: &str = "*";

/// Parsed `[METHOD ]path` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping<'a> {
    /// Lowercased verb, or [`ANY_METHOD`].
    pub method: String,
    pub path: &'a str,
}

/// Parse a mapping string.
pub fn parse_mapping(raw: &str) -> Result<Mapping<'_>, RouteError> {
    let mut parts = raw.split_whitespace();
    let first = parts.next().ok_or(RouteError::MissingMapping)?;
    match parts.next() {
        Some(path) => Ok(Mapping {
            method: method_key(first),
            path,
        }),
        None => Ok(Mapping {
            method: ANY_METHOD.to_string(),
            path: first,
        }),
    }
}

fn method_key(verb: &str) -> String {
    let verb = verb.to_lowercase();
    match verb.as_str() {
        "any" | "all" | ANY_METHOD => ANY_METHOD.to_string(),
        _ => verb,
    }
}

/// Non-empty segments of a path.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Non-empty segments of a path with the byte offset right after each one.
pub fn segment_ends(path: &str) -> Vec<(&str, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for part in path.split('/') {
        let end = offset + part.len();
        if !part.is_empty() {
            spans.push((part, end));
        }
        offset = end + 1;
    }
    spans
}

/// One segment of a registration path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Lowercased static key.
    Static(String),
    /// Parameter name (may be empty, which registration rejects).
    Param(&'a str),
}

impl<'a> Segment<'a> {
    pub fn classify(raw: &'a str, marker: char) -> Self {
        match raw.strip_prefix(marker) {
            Some(name) => Segment::Param(name),
            None => Segment::Static(raw.to_lowercase()),
        }
    }
}

/// Route declaration: mapping, handlers and an optional action name.
pub struct RouteSpec {
    pub name: Option<String>,
    pub mapping: String,
    pub handlers: Vec<SharedHandler>,
}

impl RouteSpec {
    pub fn new(mapping: impl Into<String>, handlers: impl IntoHandlers) -> Self {
        Self {
            name: None,
            mapping: mapping.into(),
            handlers: handlers.into_handlers(),
        }
    }

    /// Attach an action name; the route is then subject to authorization.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), RouteError> {
        if self.mapping.trim().is_empty() {
            return Err(RouteError::MissingMapping);
        }
        if self.handlers.is_empty() {
            return Err(RouteError::MissingHandler);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("name", &self.name)
            .field("mapping", &self.mapping)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
