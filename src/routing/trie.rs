//! Route trie.
//!
//! # Responsibilities
//! - One node per path position: static children, one parametric child,
//!   per-method route descriptors
//! - Mount slots holding a middleware handler or a nested router
//! - Enforce parameter naming rules while registering, before any node is
//!   created
//!
//! # Design Decisions
//! - Static keys are lowercased; captured values are kept verbatim
//! - A parametric child binds a single name; a second name at the same
//!   position is a collision
//! - Nodes are never removed (route tables are static)

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::routing::error::RouteError;
use crate::routing::handler::SharedHandler;
use crate::routing::mapping::Segment;
use crate::routing::router::RouterId;

/// Handlers and optional action name bound to one (node, method) pair.
#[derive(Clone)]
pub struct RouteDescriptor {
    pub name: Option<String>,
    pub handlers: Vec<SharedHandler>,
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Middleware mounted under a prefix.
pub(crate) struct MiddlewareMount {
    pub handler: SharedHandler,
    /// Prefix as given to `mount`.
    pub prefix: String,
}

/// What a static key of a node points at.
pub(crate) enum Slot {
    Node(RouteNode),
    Middleware(MiddlewareMount),
    Router(RouterId),
}

pub(crate) struct ParamBranch {
    pub name: String,
    pub node: RouteNode,
}

#[derive(Default)]
pub(crate) struct RouteNode {
    pub statics: HashMap<String, Slot>,
    pub param: Option<Box<ParamBranch>>,
    pub methods: HashMap<String, RouteDescriptor>,
}

/// Result of walking a registration path through one router's trie.
pub(crate) enum Walk<'a> {
    /// Every segment consumed inside this trie.
    Reached(&'a mut RouteNode),
    /// The walk ran into a mounted router after `consumed` segments.
    Crossed { router: RouterId, consumed: usize },
}

/// Result of inspecting a registration path without creating nodes.
pub(crate) enum Inspect<'a> {
    /// Every segment leads to an existing node.
    Found(&'a RouteNode),
    /// Some segment has no node yet.
    Absent,
    /// The path runs into a mounted router after `consumed` segments.
    Crossed { router: RouterId, consumed: usize },
}

impl RouteNode {
    /// True when nothing has been registered at or below this node.
    pub fn is_vacant(&self) -> bool {
        self.statics.is_empty() && self.param.is_none() && self.methods.is_empty()
    }

    /// Walk `segments`, creating missing nodes.
    ///
    /// `seen` collects parameter names of the whole mapping so a name used
    /// twice in one path is rejected even across mounted routers.
    pub fn walk_mut<'a>(
        &'a mut self,
        segments: &[Segment<'_>],
        seen: &mut HashSet<String>,
        mapping: &str,
    ) -> Result<Walk<'a>, RouteError> {
        let mut node = self;
        for (index, segment) in segments.iter().enumerate() {
            node = match segment {
                Segment::Static(key) => {
                    let slot = node
                        .statics
                        .entry(key.clone())
                        .or_insert_with(|| Slot::Node(RouteNode::default()));
                    match slot {
                        Slot::Node(child) => child,
                        Slot::Router(router) => {
                            return Ok(Walk::Crossed {
                                router: *router,
                                consumed: index + 1,
                            })
                        }
                        Slot::Middleware(_) => return Err(RouteError::PathUsedByMiddleware),
                    }
                }
                Segment::Param(name) => {
                    claim_param(name, seen, mapping)?;
                    let branch = node.param.get_or_insert_with(|| {
                        Box::new(ParamBranch {
                            name: name.to_string(),
                            node: RouteNode::default(),
                        })
                    });
                    if branch.name != *name {
                        return Err(collision(&branch.name, name, mapping));
                    }
                    &mut branch.node
                }
            };
        }
        Ok(Walk::Reached(node))
    }

    /// Read-only counterpart of [`walk_mut`](Self::walk_mut): applies the same
    /// checks to every segment but never creates a node.
    pub fn inspect<'a>(
        &'a self,
        segments: &[Segment<'_>],
        seen: &mut HashSet<String>,
        mapping: &str,
    ) -> Result<Inspect<'a>, RouteError> {
        let mut node = Some(self);
        for (index, segment) in segments.iter().enumerate() {
            node = match segment {
                Segment::Static(key) => match node.and_then(|n| n.statics.get(key)) {
                    Some(Slot::Node(child)) => Some(child),
                    Some(Slot::Router(router)) => {
                        return Ok(Inspect::Crossed {
                            router: *router,
                            consumed: index + 1,
                        })
                    }
                    Some(Slot::Middleware(_)) => return Err(RouteError::PathUsedByMiddleware),
                    None => None,
                },
                Segment::Param(name) => {
                    claim_param(name, seen, mapping)?;
                    match node.and_then(|n| n.param.as_deref()) {
                        Some(branch) if branch.name != *name => {
                            return Err(collision(&branch.name, name, mapping))
                        }
                        Some(branch) => Some(&branch.node),
                        None => None,
                    }
                }
            };
        }
        Ok(match node {
            Some(node) => Inspect::Found(node),
            None => Inspect::Absent,
        })
    }
}

/// Record a parameter name of the mapping being registered.
fn claim_param(name: &str, seen: &mut HashSet<String>, mapping: &str) -> Result<(), RouteError> {
    if name.is_empty() {
        return Err(RouteError::UnnamedParameter {
            mapping: mapping.to_string(),
        });
    }
    if !seen.insert(name.to_string()) {
        return Err(RouteError::DuplicateParameter {
            param: name.to_string(),
            mapping: mapping.to_string(),
        });
    }
    Ok(())
}

fn collision(existing: &str, param: &str, mapping: &str) -> RouteError {
    RouteError::ParameterCollision {
        existing: existing.to_string(),
        param: param.to_string(),
        mapping: mapping.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs<'a>(path: &'a str) -> Vec<Segment<'a>> {
        crate::routing::mapping::split_path(path)
            .map(|s| Segment::classify(s, ':'))
            .collect()
    }

    fn reach<'a>(node: &'a mut RouteNode, path: &str) -> Result<&'a mut RouteNode, RouteError> {
        let segments = segs(path);
        match node.walk_mut(&segments, &mut HashSet::new(), path)? {
            Walk::Reached(node) => Ok(node),
            Walk::Crossed { .. } => panic!("unexpected router crossing"),
        }
    }

    #[test]
    fn test_walk_creates_nodes() {
        let mut root = RouteNode::default();
        assert!(root.is_vacant());
        reach(&mut root, "/Test/:id").unwrap();
        assert!(root.statics.contains_key("test"));
        let Some(Slot::Node(test)) = root.statics.get("test") else {
            panic!("expected node");
        };
        assert_eq!(test.param.as_ref().map(|b| b.name.as_str()), Some("id"));
    }

    #[test]
    fn test_same_param_name_reused() {
        let mut root = RouteNode::default();
        reach(&mut root, "/test/:id").unwrap();
        reach(&mut root, "/test/:id/sub").unwrap();
    }

    #[test]
    fn test_param_collision() {
        let mut root = RouteNode::default();
        reach(&mut root, "/test/:id").unwrap();
        let err = reach(&mut root, "/test/:testId").err().unwrap();
        assert_eq!(
            err,
            RouteError::ParameterCollision {
                existing: "id".into(),
                param: "testId".into(),
                mapping: "/test/:testId".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_param_in_one_path() {
        let mut root = RouteNode::default();
        reach(&mut root, "/test/:id/item/:other").unwrap();
        let err = reach(&mut root, "/test/:id/item/:id").err().unwrap();
        assert_eq!(
            err.to_string(),
            "duplicate parameter 'id' in route '/test/:id/item/:id'"
        );
    }

    #[test]
    fn test_unnamed_param() {
        let mut root = RouteNode::default();
        let err = reach(&mut root, "/test/:").err().unwrap();
        assert_eq!(err.to_string(), "unnamed parameter in route '/test/:'");
    }

    #[test]
    fn test_inspect_creates_nothing() {
        let mut root = RouteNode::default();
        reach(&mut root, "/test/:id").unwrap();

        let segments = segs("/test/:id/deeper/:other");
        let found = root
            .inspect(&segments, &mut HashSet::new(), "/test/:id/deeper/:other")
            .unwrap();
        assert!(matches!(found, Inspect::Absent));
        let Some(Slot::Node(test)) = root.statics.get("test") else {
            panic!("expected node");
        };
        assert!(test.param.as_ref().is_some_and(|b| b.node.is_vacant()));

        let segments = segs("/fresh/:x/b/:x");
        let err = root
            .inspect(&segments, &mut HashSet::new(), "/fresh/:x/b/:x")
            .err()
            .unwrap();
        assert!(matches!(err, RouteError::DuplicateParameter { .. }));
        assert!(!root.statics.contains_key("fresh"));
    }

    #[test]
    fn test_inspect_reports_collision_on_existing_branch() {
        let mut root = RouteNode::default();
        reach(&mut root, "/test/:id").unwrap();
        let segments = segs("/test/:other");
        let err = root
            .inspect(&segments, &mut HashSet::new(), "/test/:other")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "collision of parameters 'id' and 'other' in route '/test/:other'");
    }

    #[test]
    fn test_walk_stops_at_router_mount() {
        let mut root = RouteNode::default();
        root.statics.insert("sub".into(), Slot::Router(RouterId(3)));
        let segments = segs("/sub/a/b");
        match root.walk_mut(&segments, &mut HashSet::new(), "/sub/a/b").unwrap() {
            Walk::Crossed { router, consumed } => {
                assert_eq!(router, RouterId(3));
                assert_eq!(consumed, 1);
            }
            Walk::Reached(_) => panic!("expected crossing"),
        }
    }
}
