//! Role specification language.
//!
//! A specification is a list of tokens, written either as a sequence or as a
//! single string delimited by whitespace and/or commas:
//!
//! ```text
//! token := perm | "@" role | "!" perm | "!@" role
//! ```
//!
//! Both shapes normalize to the same token list before compilation. Tokens
//! are folded left to right, so their order is significant.

use serde::Deserialize;
use serde_json::Value;

use crate::rbac::error::{CompileFailure, RbacError};

/// Marks an exclusion (`!perm`, `!@role`).
pub const EXCLUDE_MARK: char = '!';
/// Marks a role reference (`@role`, `!@role`).
pub const ROLE_REF_MARK: char = '@';
/// Permission granting every action.
pub const WILDCARD: &str = "*";

/// A role specification (or a role specifier list) as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub enum RoleSpec {
    /// `"@role_1 !p3, p4"`
    Delimited(String),
    /// `["@role_1", "!p3", "p4"]`
    Tokens(Vec<String>),
}

impl RoleSpec {
    /// Normalize into the ordered token list.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            RoleSpec::Delimited(raw) => split_delimited(raw).map(str::to_string).collect(),
            RoleSpec::Tokens(tokens) => tokens
                .iter()
                .filter(|t| !t.is_empty())
                .cloned()
                .collect(),
        }
    }
}

fn split_delimited(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

impl From<&str> for RoleSpec {
    fn from(raw: &str) -> Self {
        RoleSpec::Delimited(raw.to_string())
    }
}

impl From<String> for RoleSpec {
    fn from(raw: String) -> Self {
        RoleSpec::Delimited(raw)
    }
}

impl From<Vec<String>> for RoleSpec {
    fn from(tokens: Vec<String>) -> Self {
        RoleSpec::Tokens(tokens)
    }
}

impl From<Vec<&str>> for RoleSpec {
    fn from(tokens: Vec<&str>) -> Self {
        RoleSpec::Tokens(tokens.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RoleSpec {
    fn from(tokens: [&str; N]) -> Self {
        RoleSpec::Tokens(tokens.iter().map(|t| t.to_string()).collect())
    }
}

impl TryFrom<Value> for RoleSpec {
    type Error = RbacError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(raw) => Ok(RoleSpec::Delimited(raw)),
            Value::Array(items) => {
                let mut tokens = Vec::with_capacity(items.len());
                for item in &items {
                    match item {
                        Value::String(token) => tokens.push(token.clone()),
                        _ => {
                            return Err(RbacError::InvalidSpecification(
                                Value::Array(items.clone()).to_string(),
                            ))
                        }
                    }
                }
                Ok(RoleSpec::Tokens(tokens))
            }
            other => Err(RbacError::InvalidSpecification(other.to_string())),
        }
    }
}

/// One parsed specification token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Grant(&'a str),
    Revoke(&'a str),
    IncludeRole(&'a str),
    ExcludeRole(&'a str),
}

impl<'a> Token<'a> {
    /// Classify a token by its leading marker.
    pub fn parse(raw: &'a str) -> Result<Self, CompileFailure> {
        if let Some(rest) = raw.strip_prefix(EXCLUDE_MARK) {
            if let Some(role) = rest.strip_prefix(ROLE_REF_MARK) {
                if role.is_empty() {
                    return Err(CompileFailure::InvalidExcludeRoleReference);
                }
                return Ok(Token::ExcludeRole(role));
            }
            if rest.is_empty() {
                return Err(CompileFailure::InvalidExcludeSpecification);
            }
            return Ok(Token::Revoke(rest));
        }
        if let Some(role) = raw.strip_prefix(ROLE_REF_MARK) {
            if role.is_empty() {
                return Err(CompileFailure::InvalidRoleReference);
            }
            return Ok(Token::IncludeRole(role));
        }
        Ok(Token::Grant(raw))
    }

    /// The referenced role, for role tokens.
    pub fn role_ref(&self) -> Option<&'a str> {
        match self {
            Token::IncludeRole(role) | Token::ExcludeRole(role) => Some(role),
            _ => None,
        }
    }
}
