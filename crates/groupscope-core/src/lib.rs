//! Groupscope Core Types
//!
//! This crate provides the component registries and the scope hierarchy that
//! the Groupscope parser resolves references against. It includes:
//!
//! - **References**: Loadable and materialized components ([`reference`] module)
//! - **Registry**: A name-keyed component store ([`registry::RuleElementRegistry`])
//! - **Loader**: Loading components by logical name ([`loader::Loader`])
//! - **Scope**: The arena of nested registries and deferred resolution ([`scope::ScopeTree`])

pub mod error;
pub mod loader;
pub mod reference;
pub mod registry;
pub mod scope;

pub use error::{LoadError, LoadFailure, RegistryError, ResolveError, ScopeError};
