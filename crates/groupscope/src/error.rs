//! Error types for Groupscope operations.
//!
//! This module provides the main error type [`GroupscopeError`] which wraps
//! the error conditions of parsing, scope manipulation and resolution.

use std::io;

use thiserror::Error;

use groupscope_core::error::{ResolveError, ScopeError};
use groupscope_parser::error::ParseError;

/// The main error type for Groupscope operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the parsed source next to the diagnostics so
/// that their spans can be rendered as source snippets.
#[derive(Debug, Error)]
pub enum GroupscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GroupscopeError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
