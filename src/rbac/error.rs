//! Role compilation errors.

use std::fmt;
use thiserror::Error;

/// Why a particular role failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileFailure {
    /// The role has no stored specification and none was supplied.
    NoSpecification,
    /// `!@` with an empty role name.
    InvalidExcludeRoleReference,
    /// `!` with an empty permission.
    InvalidExcludeSpecification,
    /// `@` with an empty role name.
    InvalidRoleReference,
    /// The role transitively references itself. Holds the reference path,
    /// starting and ending with the role being compiled.
    CircularReference(Vec<String>),
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileFailure::NoSpecification => write!(f, "no specification"),
            CompileFailure::InvalidExcludeRoleReference => {
                write!(f, "invalid exclude role reference")
            }
            CompileFailure::InvalidExcludeSpecification => {
                write!(f, "invalid exclude specification")
            }
            CompileFailure::InvalidRoleReference => write!(f, "invalid role reference"),
            CompileFailure::CircularReference(path) => {
                write!(f, "circular role reference: {}", path.join(" -> "))
            }
        }
    }
}

/// Errors raised by the role compiler and matcher.
///
/// All of these are setup-time programmer errors; none of them is a
/// dispatch outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RbacError {
    /// A specification value had neither the delimited-string nor the
    /// token-sequence shape.
    #[error("invalid specification: {0}")]
    InvalidSpecification(String),

    /// A role specification could not be compiled.
    #[error("could not compile role '{role}': {reason}")]
    Compile { role: String, reason: CompileFailure },
}

impl RbacError {
    pub(crate) fn compile(role: &str, reason: CompileFailure) -> Self {
        RbacError::Compile {
            role: role.to_string(),
            reason,
        }
    }
}
