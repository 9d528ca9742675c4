//! # Groupscope Parser
//!
//! A recursive grouping parser for text made of fragments joined by
//! operators, with parentheses for nesting. The parser itself only knows
//! about operators, parentheses and end conditions; what a fragment means is
//! decided by a [`FragmentParser`] supplied by the caller.
//!
//! Fragment parsers receive a scope of a
//! [`ScopeTree`](groupscope_core::scope::ScopeTree) and may queue component
//! loads there. Parsing stays synchronous; the queued loads are resolved
//! afterwards in a single asynchronous pass.
//!
//! ## Usage
//!
//! ```
//! use groupscope_core::scope::{ScopeId, ScopeTree};
//! use groupscope_parser::{
//!     FragmentOutcome, FragmentParser, Grammar, GroupingParser, error::Diagnostic,
//! };
//!
//! struct Words;
//!
//! impl FragmentParser<()> for Words {
//!     type Reference = String;
//!
//!     fn parse<'i>(
//!         &self,
//!         text: &'i str,
//!         _tree: &mut ScopeTree<()>,
//!         _scope: ScopeId,
//!     ) -> Result<FragmentOutcome<'i, String>, Diagnostic> {
//!         let end = text
//!             .find(|c: char| !c.is_alphanumeric())
//!             .unwrap_or(text.len());
//!         if end == 0 {
//!             return Err(Diagnostic::error("expected a word"));
//!         }
//!         Ok(FragmentOutcome::new(&text[end..], text[..end].to_string()))
//!     }
//! }
//!
//! let mut tree = ScopeTree::new();
//! let root = tree.create_scope(None, "root");
//! let grammar = Grammar::new(vec!["and", "or"], "and");
//!
//! let outcome = GroupingParser::new(Words)
//!     .parse("alpha or (beta and gamma)", &mut tree, root, &grammar, None)
//!     .unwrap();
//! let grouping = outcome.grouping.unwrap();
//! assert_eq!(grouping.len(), 2);
//! assert_eq!(grouping.fragments().len(), 3);
//! ```

pub mod error;
pub mod fragment;
pub mod grouping;
pub mod inference;
mod parser;
mod span;

pub use error::{Diagnostic, ErrorCode, ParseError, Severity};
pub use fragment::{FragmentOutcome, FragmentParser};
pub use grouping::{Fragment, Grouping, Node};
pub use inference::{HasRefName, InferenceError, InferenceStack};
pub use parser::{EndCondition, Grammar, GroupingParser, MAX_NESTING_DEPTH, ParseOutcome};
pub use span::Span;
