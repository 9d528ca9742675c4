//! The fragment parser collaborator.
//!
//! The grouping parser owns operators and parentheses. Everything else is a
//! fragment, and its meaning is decided by a [`FragmentParser`]. A fragment
//! parser may register components or queue module loads in the scope it is
//! handed; the reference it returns is then a placeholder that becomes usable
//! after [`ScopeTree::resolve`](groupscope_core::scope::ScopeTree::resolve).

use groupscope_core::scope::{ScopeId, ScopeTree};

use crate::error::Diagnostic;

/// Result of parsing one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentOutcome<'i, R> {
    /// Unconsumed suffix of the text the parser was given.
    pub remaining: &'i str,
    pub reference: R,
    /// Non-fatal messages. Spans are relative to the start of the fragment
    /// text; a message without labels is pinned to the fragment position.
    pub diagnostics: Vec<Diagnostic>,
}

impl<'i, R> FragmentOutcome<'i, R> {
    pub fn new(remaining: &'i str, reference: R) -> Self {
        Self {
            remaining,
            reference,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }
}

/// Parses the leaves of a grouping.
///
/// `C` is the component type stored in the scope tree.
pub trait FragmentParser<C> {
    /// The value stored in each [`Fragment`](crate::grouping::Fragment).
    type Reference;

    /// Consume a prefix of `text` and return what it denotes.
    ///
    /// `text` starts at the fragment, with leading whitespace removed. The
    /// returned `remaining` must be a strict suffix of `text`.
    ///
    /// # Errors
    ///
    /// Returns a diagnostic when `text` does not start with a fragment this
    /// parser understands. Spans are relative to the start of `text`.
    fn parse<'i>(
        &self,
        text: &'i str,
        tree: &mut ScopeTree<C>,
        scope: ScopeId,
    ) -> Result<FragmentOutcome<'i, Self::Reference>, Diagnostic>;
}

impl<C, T> FragmentParser<C> for &T
where
    T: FragmentParser<C> + ?Sized,
{
    type Reference = T::Reference;

    fn parse<'i>(
        &self,
        text: &'i str,
        tree: &mut ScopeTree<C>,
        scope: ScopeId,
    ) -> Result<FragmentOutcome<'i, Self::Reference>, Diagnostic> {
        (**self).parse(text, tree, scope)
    }
}
