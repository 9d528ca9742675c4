//! Error and diagnostic system for the grouping parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled spans pointing into the parsed text
//! - Severity levels
//! - Diagnostic collector for accumulating messages while parsing
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single informational message, warning or error with optional error code,
//! source locations, help text and a free-form context payload. A fatal parse
//! is reported as a [`ParseError`], which keeps every diagnostic emitted
//! before the fatal one.
//!
//! # Example
//!
//! ```
//! # use groupscope_parser::error::{Diagnostic, ErrorCode};
//! # use groupscope_parser::Span;
//!
//! let diag = Diagnostic::error("expected operator near `12345`")
//!     .with_code(ErrorCode::E100)
//!     .with_label(Span::new(11..16), "operator missing before this item")
//!     .with_help("join items with one of: and, or");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use parse_error::Result;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
