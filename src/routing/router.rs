//! Router instances, registration and lookup.
//!
//! # Responsibilities
//! - Own every router's trie and options in one arena
//! - Register routes and mounts, crossing into mounted routers
//! - Keep the global action registry unique
//! - Resolve a request path to a route node, a middleware mount or nothing
//!
//! # Design Decisions
//! - Routers are addressed by [`RouterId`]; a mounted router is a slot
//!   holding its id, so tries never own each other
//! - Options live behind `ArcSwap` so they can be replaced while requests
//!   are in flight
//! - Registration first inspects the path read-only, so a rejected route or
//!   mount leaves every trie untouched; it then walks twice: once to find
//!   which router owns the terminal node, once to create it there

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::error::RouteError;
use crate::routing::handler::{IntoHandlers, SharedHandler};
use crate::routing::mapping::{parse_mapping, segment_ends, split_path, RouteSpec, Segment};
use crate::routing::options::RouterOptions;
use crate::routing::trie::{Inspect, MiddlewareMount, RouteDescriptor, RouteNode, Slot, Walk};

/// Handle of a router owned by a [`Dispatcher`](crate::routing::Dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouterId(pub(crate) usize);

/// Target of [`RouterMut::mount`].
pub enum Mount {
    /// Receives every request under the prefix, with the prefix stripped
    /// from the path.
    Middleware(SharedHandler),
    /// A router that is not mounted anywhere yet.
    Router(RouterId),
}

pub(crate) struct RouterData {
    pub root: RouteNode,
    pub options: ArcSwap<RouterOptions>,
    pub parent: Option<RouterId>,
}

/// Result of resolving a request path.
pub(crate) enum Lookup<'r> {
    /// Every segment matched; `router` is the router the path ended in.
    Route {
        router: RouterId,
        node: &'r RouteNode,
        params: HashMap<String, String>,
    },
    /// A middleware mount was reached; `rest` is the byte offset of the
    /// unconsumed remainder of the path.
    Middleware {
        mount: &'r MiddlewareMount,
        rest: usize,
    },
    /// A segment matched nothing inside `router`.
    Missing { router: RouterId },
}

pub(crate) struct Routes {
    routers: Vec<RouterData>,
    actions: HashSet<String>,
    param_marker: char,
}

impl Routes {
    pub fn new(options: RouterOptions, param_marker: char) -> Self {
        let mut routes = Self {
            routers: Vec::new(),
            actions: HashSet::new(),
            param_marker,
        };
        routes.create(options);
        routes
    }

    pub fn root_id(&self) -> RouterId {
        RouterId(0)
    }

    pub fn create(&mut self, options: RouterOptions) -> RouterId {
        let id = RouterId(self.routers.len());
        self.routers.push(RouterData {
            root: RouteNode::default(),
            options: ArcSwap::from_pointee(options),
            parent: None,
        });
        id
    }

    pub fn contains(&self, id: RouterId) -> bool {
        id.0 < self.routers.len()
    }

    fn data(&self, id: RouterId) -> Result<&RouterData, RouteError> {
        self.routers.get(id.0).ok_or(RouteError::UnknownRouter)
    }

    pub fn actions(&self) -> &HashSet<String> {
        &self.actions
    }

    pub fn options(&self, id: RouterId) -> Result<Arc<RouterOptions>, RouteError> {
        Ok(self.data(id)?.options.load_full())
    }

    pub fn set_options(&self, id: RouterId, options: RouterOptions) -> Result<(), RouteError> {
        self.data(id)?.options.store(Arc::new(options));
        Ok(())
    }

    /// Options of `id` merged over those of all its ancestors.
    pub fn effective_options(&self, id: RouterId) -> Result<RouterOptions, RouteError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(router) = current {
            let data = self.data(router)?;
            chain.push(data.options.load_full());
            current = data.parent;
        }
        let mut effective = RouterOptions::default();
        for options in chain.iter().rev() {
            effective.merge(options);
        }
        Ok(effective)
    }

    /// Validate `segments` from the root of `at` without creating nodes.
    /// Returns the router owning the end of the path and its terminal node,
    /// if that node already exists.
    fn inspect(
        &self,
        at: RouterId,
        segments: &[Segment<'_>],
        mapping: &str,
    ) -> Result<(RouterId, Option<&RouteNode>), RouteError> {
        let mut seen = HashSet::new();
        let mut router = at;
        let mut offset = 0;
        loop {
            match self.data(router)?.root.inspect(&segments[offset..], &mut seen, mapping)? {
                Inspect::Crossed { router: next, consumed } => {
                    router = next;
                    offset += consumed;
                }
                Inspect::Found(node) => return Ok((router, Some(node))),
                Inspect::Absent => return Ok((router, None)),
            }
        }
    }

    /// Follow `segments` from the root of `at`, crossing mounted routers.
    /// Returns the router owning the rest of the path and how many segments
    /// were consumed before entering it.
    fn locate(
        &mut self,
        at: RouterId,
        segments: &[Segment<'_>],
        seen: &mut HashSet<String>,
        mapping: &str,
    ) -> Result<(RouterId, usize), RouteError> {
        let mut router = at;
        let mut offset = 0;
        loop {
            let data = self
                .routers
                .get_mut(router.0)
                .ok_or(RouteError::UnknownRouter)?;
            match data.root.walk_mut(&segments[offset..], seen, mapping)? {
                Walk::Crossed { router: next, consumed } => {
                    router = next;
                    offset += consumed;
                }
                Walk::Reached(_) => return Ok((router, offset)),
            }
        }
    }

    /// Node at the end of `segments`, created as needed.
    fn reach(
        &mut self,
        at: RouterId,
        segments: &[Segment<'_>],
        mapping: &str,
    ) -> Result<(RouterId, &mut RouteNode), RouteError> {
        let (owner, offset) = self.locate(at, segments, &mut HashSet::new(), mapping)?;
        let data = self
            .routers
            .get_mut(owner.0)
            .ok_or(RouteError::UnknownRouter)?;
        match data.root.walk_mut(&segments[offset..], &mut HashSet::new(), mapping)? {
            Walk::Reached(node) => Ok((owner, node)),
            Walk::Crossed { .. } => Err(RouteError::UnknownRouter),
        }
    }

    pub fn register(&mut self, at: RouterId, route: RouteSpec) -> Result<(), RouteError> {
        route.validate()?;
        let RouteSpec {
            name,
            mapping,
            handlers,
        } = route;
        let parsed = parse_mapping(&mapping)?;
        let marker = self.param_marker;
        let segments: Vec<Segment<'_>> = split_path(parsed.path)
            .map(|raw| Segment::classify(raw, marker))
            .collect();

        let (_, existing) = self.inspect(at, &segments, &mapping)?;
        if let Some(name) = &name {
            if self.actions.contains(name) {
                // a name may only be re-registered on the slot that already holds it
                let same_slot = existing
                    .and_then(|node| node.methods.get(&parsed.method))
                    .and_then(|descriptor| descriptor.name.as_ref())
                    == Some(name);
                if !same_slot {
                    return Err(RouteError::DuplicateName(name.clone()));
                }
            }
        }

        let (owner, node) = self.reach(at, &segments, &mapping)?;
        let replaced = node.methods.insert(
            parsed.method.clone(),
            RouteDescriptor {
                name: name.clone(),
                handlers,
            },
        );
        if let Some(old) = replaced.and_then(|d| d.name) {
            self.actions.remove(&old);
        }
        if let Some(name) = &name {
            self.actions.insert(name.clone());
        }
        tracing::debug!(
            router = owner.0,
            method = %parsed.method,
            path = %parsed.path,
            action = name.as_deref().unwrap_or("-"),
            "Route registered"
        );
        Ok(())
    }

    pub fn mount(&mut self, at: RouterId, prefix: &str, target: Mount) -> Result<(), RouteError> {
        if prefix.is_empty() {
            return Err(RouteError::EmptyPrefix);
        }
        let marker = self.param_marker;
        let segments: Vec<Segment<'_>> = split_path(prefix)
            .map(|raw| Segment::classify(raw, marker))
            .collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(RouteError::InvalidPrefix(prefix.to_string()));
        };
        let key = match last {
            Segment::Static(key) => key.clone(),
            Segment::Param(_) => return Err(RouteError::ParametrizedPrefix(prefix.to_string())),
        };
        if parents.iter().any(|s| matches!(s, Segment::Param(_))) {
            return Err(RouteError::ParametrizedPrefix(prefix.to_string()));
        }
        if let Mount::Router(child) = &target {
            if !self.contains(*child) {
                return Err(RouteError::UnknownRouter);
            }
        }

        let (owner, existing) = match self.inspect(at, parents, prefix) {
            Err(RouteError::PathUsedByMiddleware) => {
                return Err(RouteError::PrefixUsedByMiddleware)
            }
            other => other?,
        };
        if let Some(slot) = existing.and_then(|node| node.statics.get(&key)) {
            let vacant = matches!(slot, Slot::Node(node) if node.is_vacant());
            if !vacant {
                return Err(RouteError::MountPointOccupied(prefix.to_string()));
            }
        }

        let slot = match target {
            Mount::Middleware(handler) => Slot::Middleware(MiddlewareMount {
                handler,
                prefix: prefix.to_string(),
            }),
            Mount::Router(child) => {
                if self.routers[child.0].parent.is_some() || child == self.root_id() {
                    return Err(RouteError::AlreadyMounted);
                }
                if self.is_ancestor_or_self(child, owner) {
                    return Err(RouteError::MountCycle);
                }
                Slot::Router(child)
            }
        };
        let mounted_router = match &slot {
            Slot::Router(child) => Some(*child),
            _ => None,
        };

        let (_, node) = self.reach(at, parents, prefix)?;
        node.statics.insert(key, slot);
        if let Some(child) = mounted_router {
            self.routers[child.0].parent = Some(owner);
        }
        tracing::debug!(
            router = owner.0,
            prefix = %prefix,
            target = if mounted_router.is_some() { "router" } else { "middleware" },
            "Mounted"
        );
        Ok(())
    }

    /// True if `candidate` is `of` or one of its ancestors.
    fn is_ancestor_or_self(&self, candidate: RouterId, of: RouterId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.routers.get(id.0).and_then(|data| data.parent);
        }
        false
    }

    /// Resolve `path` starting at the root of `entry`.
    ///
    /// Static children win over the parametric child; there is no
    /// backtracking once a branch is taken.
    pub fn lookup<'r>(&'r self, entry: RouterId, path: &str) -> Lookup<'r> {
        let Some(data) = self.routers.get(entry.0) else {
            return Lookup::Missing { router: entry };
        };
        let mut router = entry;
        let mut node = &data.root;
        let mut params = HashMap::new();

        for (segment, end) in segment_ends(path) {
            match node.statics.get(&segment.to_lowercase()) {
                Some(Slot::Node(child)) => node = child,
                Some(Slot::Middleware(mount)) => return Lookup::Middleware { mount, rest: end },
                Some(Slot::Router(id)) => match self.routers.get(id.0) {
                    Some(mounted) => {
                        router = *id;
                        node = &mounted.root;
                    }
                    None => return Lookup::Missing { router },
                },
                None => match &node.param {
                    Some(branch) => {
                        params.insert(branch.name.clone(), segment.to_string());
                        node = &branch.node;
                    }
                    None => return Lookup::Missing { router },
                },
            }
        }
        Lookup::Route {
            router,
            node,
            params,
        }
    }
}

/// Registration handle for one router.
///
/// Every method returns `&mut Self` so registrations chain:
///
/// ```ignore
/// dispatcher
///     .root()
///     .get("/items/:id", show)?
///     .post_named("items.create", "/items", create)?;
/// ```
pub struct RouterMut<'a> {
    routes: &'a mut Routes,
    id: RouterId,
}

macro_rules! verb {
    ($plain:ident, $named:ident, $verb:literal) => {
        pub fn $plain(
            &mut self,
            path: &str,
            handlers: impl IntoHandlers,
        ) -> Result<&mut Self, RouteError> {
            self.route(RouteSpec::new(format!("{} {}", $verb, path), handlers))
        }

        pub fn $named(
            &mut self,
            name: &str,
            path: &str,
            handlers: impl IntoHandlers,
        ) -> Result<&mut Self, RouteError> {
            self.route(RouteSpec::new(format!("{} {}", $verb, path), handlers).named(name))
        }
    };
}

impl<'a> RouterMut<'a> {
    pub(crate) fn new(routes: &'a mut Routes, id: RouterId) -> Self {
        Self { routes, id }
    }

    pub fn id(&self) -> RouterId {
        self.id
    }

    /// Register a route declaration.
    pub fn route(&mut self, route: RouteSpec) -> Result<&mut Self, RouteError> {
        self.routes.register(self.id, route)?;
        Ok(self)
    }

    /// Register an anonymous route from a `[METHOD ]path` mapping.
    pub fn map(&mut self, mapping: &str, handlers: impl IntoHandlers) -> Result<&mut Self, RouteError> {
        self.route(RouteSpec::new(mapping, handlers))
    }

    /// Register a named route; dispatching it is subject to authorization.
    pub fn named(
        &mut self,
        name: &str,
        mapping: &str,
        handlers: impl IntoHandlers,
    ) -> Result<&mut Self, RouteError> {
        self.route(RouteSpec::new(mapping, handlers).named(name))
    }

    verb!(get, get_named, "GET");
    verb!(post, post_named, "POST");
    verb!(put, put_named, "PUT");
    verb!(delete, delete_named, "DELETE");
    verb!(patch, patch_named, "PATCH");
    verb!(any, any_named, "ANY");

    /// Alias of [`RouterMut::any`].
    pub fn all(&mut self, path: &str, handlers: impl IntoHandlers) -> Result<&mut Self, RouteError> {
        self.any(path, handlers)
    }

    pub fn mount(&mut self, prefix: &str, target: Mount) -> Result<&mut Self, RouteError> {
        self.routes.mount(self.id, prefix, target)?;
        Ok(self)
    }

    /// This router's own options, without inherited values.
    pub fn options(&self) -> Result<Arc<RouterOptions>, RouteError> {
        self.routes.options(self.id)
    }

    pub fn set_options(&mut self, options: RouterOptions) -> Result<&mut Self, RouteError> {
        self.routes.set_options(self.id, options)?;
        Ok(self)
    }
}
