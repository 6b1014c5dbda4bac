//! Role graph compiler.
//!
//! # Responsibilities
//! - Store raw role specifications and their compiled permission sets
//! - Fold specification tokens into a permission set, in written order
//! - Track which roles reference which (the dependents map)
//! - Cascade recompilation outward when a referenced role changes, each
//!   dependent once and after the roles it references
//!
//! # Design Decisions
//! - Referencing an unknown role yields an empty set, not an error; the edge is
//!   still recorded so a later definition of that role reaches the referrer
//! - Cycles are rejected before anything is mutated
//! - Edges of a role are rebuilt on each of its compilations
//! - Single writer: callers serialize mutation (see `matcher::SharedRoles`)

use std::collections::{HashMap, HashSet};

use crate::observability::metrics;
use crate::rbac::error::{CompileFailure, RbacError};
use crate::rbac::spec::{RoleSpec, Token};

/// Set of permissions a role resolves to.
pub type PermissionSet = HashSet<String>;

#[derive(Debug, Clone)]
struct RoleEntry {
    /// Normalized specification tokens.
    spec: Vec<String>,
    /// `None` while the role is still uncompiled.
    resolved: Option<PermissionSet>,
}

/// Registry of named roles.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    roles: HashMap<String, RoleEntry>,
    /// role name -> roles whose specification references it
    dependents: HashMap<String, HashSet<String>>,
    /// roles currently being compiled further up the call stack
    in_progress: HashSet<String>,
    compilations: u64,
    null_role: PermissionSet,
}

impl RoleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `name` from `spec`, or from its stored specification when
    /// `spec` is `None`, then recompile every role depending on it.
    pub fn compile(
        &mut self,
        name: &str,
        spec: Option<&RoleSpec>,
    ) -> Result<&PermissionSet, RbacError> {
        self.compile_role(name, spec)?;
        self.recompile_dependents(name)?;

        Ok(self
            .roles
            .get(name)
            .and_then(|entry| entry.resolved.as_ref())
            .unwrap_or(&self.null_role))
    }

    /// Compile one role and store the result, without touching dependents.
    fn compile_role(&mut self, name: &str, spec: Option<&RoleSpec>) -> Result<(), RbacError> {
        let tokens = match spec {
            Some(spec) => spec.tokens(),
            None => self
                .roles
                .get(name)
                .map(|entry| entry.spec.clone())
                .ok_or_else(|| RbacError::compile(name, CompileFailure::NoSpecification))?,
        };

        let parsed = tokens
            .iter()
            .map(|token| Token::parse(token))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| RbacError::compile(name, reason))?;

        let refs: Vec<&str> = parsed.iter().filter_map(Token::role_ref).collect();
        if let Some(path) = self.find_cycle(name, &refs) {
            return Err(RbacError::compile(name, CompileFailure::CircularReference(path)));
        }

        self.in_progress.insert(name.to_string());
        let folded = self.fold(&parsed);
        self.in_progress.remove(name);
        let resolved = folded?;

        tracing::debug!(role = %name, permissions = resolved.len(), "Role compiled");
        metrics::record_role_compilation();
        self.compilations += 1;

        self.link(name, &refs);
        self.roles.insert(
            name.to_string(),
            RoleEntry {
                spec: tokens.clone(),
                resolved: Some(resolved),
            },
        );
        Ok(())
    }

    /// Compile every uncompiled role, or every role when `force` is set.
    pub fn build_all(&mut self, force: bool) -> Result<&mut Self, RbacError> {
        let mut names: Vec<String> = self.roles.keys().cloned().collect();
        names.sort();
        for name in names {
            let pending = self
                .roles
                .get(&name)
                .map(|entry| force || entry.resolved.is_none())
                .unwrap_or(false);
            if pending {
                self.compile(&name, None)?;
            }
        }
        Ok(self)
    }

    /// Replace the definition of `name` (or recompile it from its stored
    /// specification when `spec` is `None`).
    pub fn apply(&mut self, name: &str, spec: Option<&RoleSpec>) -> Result<&mut Self, RbacError> {
        self.compile(name, spec)?;
        Ok(self)
    }

    /// Replace every role and edge with the raw specifications in `specs`,
    /// optionally compiling them all.
    ///
    /// The new table is built aside and only swapped in once it is complete,
    /// so a failed prebuild leaves the current roles in place.
    pub fn setup<I, K>(&mut self, specs: I, prebuild: bool) -> Result<&mut Self, RbacError>
    where
        I: IntoIterator<Item = (K, RoleSpec)>,
        K: Into<String>,
    {
        let mut fresh = RoleRegistry::new();
        for (name, spec) in specs {
            fresh.roles.insert(
                name.into(),
                RoleEntry {
                    spec: spec.tokens(),
                    resolved: None,
                },
            );
        }
        if prebuild {
            fresh.build_all(false)?;
        }
        fresh.compilations += self.compilations;
        tracing::info!(roles = fresh.roles.len(), prebuild, "Role registry set up");
        *self = fresh;
        Ok(self)
    }

    /// Remove `name` and recompile the roles that referenced it.
    pub fn unset(&mut self, name: &str) -> Result<(), RbacError> {
        if self.roles.remove(name).is_none() {
            return Ok(());
        }
        self.unlink(name);
        tracing::debug!(role = %name, "Role removed");
        self.recompile_dependents(name)
    }

    /// Compiled permission set of `name`, compiling it on demand.
    /// Unknown roles resolve to the empty set.
    pub fn resolve(&mut self, name: &str) -> Result<&PermissionSet, RbacError> {
        let compiled = self.roles.get(name).map(|entry| entry.resolved.is_some());
        match compiled {
            None => Ok(&self.null_role),
            Some(false) => self.compile(name, None),
            Some(true) => Ok(self
                .roles
                .get(name)
                .and_then(|entry| entry.resolved.as_ref())
                .unwrap_or(&self.null_role)),
        }
    }

    /// Permission set of `name` if it is compiled; `None` for uncompiled or
    /// unknown roles.
    pub fn permissions(&self, name: &str) -> Option<&PermissionSet> {
        self.roles.get(name).and_then(|entry| entry.resolved.as_ref())
    }

    /// True when `name` is registered and already compiled.
    pub fn is_compiled(&self, name: &str) -> bool {
        self.permissions(name).is_some()
    }

    /// True when `name` is registered (raw or compiled).
    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Registered role names, sorted.
    pub fn role_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.roles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of role compilations performed so far.
    pub fn compilations(&self) -> u64 {
        self.compilations
    }

    /// Roles whose specification references `name`, sorted.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        let mut deps: Vec<String> = self
            .dependents
            .get(name)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    fn fold(&mut self, tokens: &[Token<'_>]) -> Result<PermissionSet, RbacError> {
        let mut result = PermissionSet::new();
        for token in tokens {
            match *token {
                Token::Grant(perm) => {
                    result.insert(perm.to_string());
                }
                Token::Revoke(perm) => {
                    result.remove(perm);
                }
                Token::IncludeRole(role) => {
                    for perm in self.resolve(role)? {
                        result.insert(perm.clone());
                    }
                }
                Token::ExcludeRole(role) => {
                    for perm in self.resolve(role)? {
                        result.remove(perm);
                    }
                }
            }
        }
        Ok(result)
    }

    /// Replace the outgoing edges of `name` with `refs`.
    fn link(&mut self, name: &str, refs: &[&str]) {
        self.unlink(name);
        for role in refs {
            self.dependents
                .entry(role.to_string())
                .or_default()
                .insert(name.to_string());
        }
    }

    fn unlink(&mut self, name: &str) {
        for deps in self.dependents.values_mut() {
            deps.remove(name);
        }
        self.dependents.retain(|_, deps| !deps.is_empty());
    }

    /// Recompile every role that transitively depends on `name`, once each.
    fn recompile_dependents(&mut self, name: &str) -> Result<(), RbacError> {
        for dependent in self.cascade_order(name) {
            self.compile_role(&dependent, None)?;
        }
        Ok(())
    }

    /// Registered roles reachable from `name` through the dependents map,
    /// each listed after every role of the set it references.
    ///
    /// Roles being compiled further up the stack are left out together with
    /// whatever is only reachable through them; their own compilation
    /// cascades when it completes.
    fn cascade_order(&self, name: &str) -> Vec<String> {
        let mut affected = HashSet::new();
        let mut queue = vec![name.to_string()];
        while let Some(current) = queue.pop() {
            for dependent in self.dependents_of(&current) {
                if dependent == name
                    || self.in_progress.contains(&dependent)
                    || !self.roles.contains_key(&dependent)
                {
                    continue;
                }
                if affected.insert(dependent.clone()) {
                    queue.push(dependent);
                }
            }
        }

        let mut start: Vec<&String> = affected.iter().collect();
        start.sort();
        let mut placed = HashSet::new();
        let mut order = Vec::with_capacity(affected.len());
        for role in start {
            self.place(role, &affected, &mut placed, &mut order);
        }
        order
    }

    fn place(
        &self,
        role: &str,
        affected: &HashSet<String>,
        placed: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) {
        if !placed.insert(role.to_string()) {
            return;
        }
        if let Some(entry) = self.roles.get(role) {
            for token in &entry.spec {
                let reference = Token::parse(token).ok().and_then(|token| token.role_ref());
                if let Some(reference) = reference.filter(|r| affected.contains(*r)) {
                    self.place(reference, affected, placed, order);
                }
            }
        }
        order.push(role.to_string());
    }

    /// Reference path from `name` back to itself through `refs`, if any.
    fn find_cycle(&self, name: &str, refs: &[&str]) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        for role in refs {
            let mut path = vec![name.to_string()];
            if self.reaches(role, name, &mut visited, &mut path) {
                return Some(path);
            }
        }
        None
    }

    fn reaches(
        &self,
        from: &str,
        target: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        path.push(from.to_string());
        if from == target {
            return true;
        }
        if visited.insert(from.to_string()) {
            if let Some(entry) = self.roles.get(from) {
                for token in &entry.spec {
                    let next = match Token::parse(token) {
                        Ok(token) => token.role_ref(),
                        Err(_) => None,
                    };
                    if let Some(next) = next {
                        if self.reaches(next, target, visited, path) {
                            return true;
                        }
                    }
                }
            }
        }
        path.pop();
        false
    }
}
