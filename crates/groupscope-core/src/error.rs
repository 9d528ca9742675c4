//! Error types for registries, scopes, loading and resolution.

use thiserror::Error;

use crate::scope::ScopeId;

/// Errors raised by a [`RuleElementRegistry`](crate::registry::RuleElementRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{ref_name}` is already registered")]
    Duplicate { ref_name: String },

    #[error("`{ref_name}` is not registered")]
    NotFound { ref_name: String },

    #[error("invalid reference `{ref_name}`: {reason}")]
    InvalidReference { ref_name: String, reason: String },
}

/// Errors raised while manipulating a [`ScopeTree`](crate::scope::ScopeTree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("scope `{scope}` has no slot `{slot}`")]
    UnknownSlot { scope: String, slot: String },

    #[error("scope inconsistency: {0}")]
    ScopeInconsistency(String),

    #[error("re-parenting `{scope}` under `{parent}` would create a cycle")]
    WouldCycle { scope: String, parent: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors produced by a [`Loader`](crate::loader::Loader).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unknown module `{0}`")]
    UnknownModule(String),

    #[error("module `{module}` has no {factory}")]
    UnknownFactory { module: String, factory: String },

    #[error(
        "module `{module}` names both function `{function}` and constructor `{constructor}`, only one is allowed"
    )]
    ConflictingFactory {
        module: String,
        function: String,
        constructor: String,
    },

    #[error("module reference has an empty {part} name")]
    EmptyName { part: &'static str },

    #[error("factory in module `{module}` failed: {message}")]
    Factory { module: String, message: String },

    #[error("component `{ref_name}` failed validation")]
    Validation { ref_name: String },
}

/// A single failed load, kept for aggregate reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub ref_name: String,
    pub error: LoadError,
}

/// Errors raised by [`ScopeTree::resolve`](crate::scope::ScopeTree::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(
        "{count} pending load(s) failed in scope `{scope_name}`: {details}",
        count = .failures.len(),
        details = describe(.failures)
    )]
    LoaderFailure {
        scope: ScopeId,
        scope_name: String,
        failures: Vec<LoadFailure>,
    },

    #[error("`{ref_name}` cannot be resolved in scope `{scope_name}`: slot `{slot}` no longer exists")]
    UnresolvedReference {
        scope: ScopeId,
        scope_name: String,
        ref_name: String,
        slot: String,
    },

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

impl ResolveError {
    /// The scope whose pending queue could not be resolved, if known.
    pub fn scope(&self) -> Option<ScopeId> {
        match self {
            ResolveError::LoaderFailure { scope, .. }
            | ResolveError::UnresolvedReference { scope, .. } => Some(*scope),
            ResolveError::Scope(_) => None,
        }
    }
}

fn describe(failures: &[LoadFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("`{}`: {}", failure.ref_name, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}
