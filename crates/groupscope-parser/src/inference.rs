//! Ordered stacks of named sub-parsers.
//!
//! Inference parsing handles text that carries no explicit hint about what
//! it is: every parser on an [`InferenceStack`] is tried in stack order and
//! the first one that recognizes the text wins. Parsers are keyed by their
//! ref name and may be registered directly or loaded by name later through a
//! [`Loader`].

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use log::{debug, error, warn};
use thiserror::Error;

use groupscope_core::{
    error::{LoadError, LoadFailure, RegistryError},
    loader::Loader,
    reference::ModuleReference,
};

use crate::error::{Diagnostic, ErrorCode};

/// Anything keyed by a ref name.
pub trait HasRefName {
    fn ref_name(&self) -> &str;
}

impl<T: HasRefName + ?Sized> HasRefName for Box<T> {
    fn ref_name(&self) -> &str {
        (**self).ref_name()
    }
}

impl<T: HasRefName + ?Sized> HasRefName for Arc<T> {
    fn ref_name(&self) -> &str {
        (**self).ref_name()
    }
}

/// Errors raised by an [`InferenceStack`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("cannot insert `{ref_name}` at position {index}, the stack holds {len} parser(s)")]
    StackIndexOutOfRange {
        ref_name: String,
        index: usize,
        len: usize,
    },

    #[error("mismatch in stack contents: requested [{}], existing [{}]", requested.join(", "), existing.join(", "))]
    StackMismatch {
        requested: Vec<String>,
        existing: Vec<String>,
    },

    #[error(transparent)]
    Reference(#[from] RegistryError),

    #[error("{} parser load(s) failed: {}", failures.len(), describe(failures))]
    Resolve { failures: Vec<LoadFailure> },
}

impl InferenceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            InferenceError::StackIndexOutOfRange { .. } => ErrorCode::E200,
            InferenceError::StackMismatch { .. } => ErrorCode::E201,
            InferenceError::Reference(_) | InferenceError::Resolve { .. } => ErrorCode::E202,
        }
    }

    /// Render as a diagnostic for uniform reporting.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).with_code(self.code())
    }
}

fn describe(failures: &[LoadFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("`{}`: {}", failure.ref_name, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}

struct PendingParser {
    reference: ModuleReference,
    index: Option<usize>,
}

/// An ordered, name-keyed stack of parsers.
///
/// # Examples
///
/// ```
/// use groupscope_parser::inference::{HasRefName, InferenceStack};
///
/// struct Named(&'static str);
/// impl HasRefName for Named {
///     fn ref_name(&self) -> &str {
///         self.0
///     }
/// }
///
/// let mut stack = InferenceStack::new();
/// stack.add(Named("number"), false);
/// stack.add(Named("word"), false);
/// stack.add_at(Named("quoted"), 1).unwrap();
/// assert_eq!(stack.stack(), ["number", "quoted", "word"]);
/// ```
pub struct InferenceStack<P> {
    parsers: IndexMap<String, P>,
    pending: Vec<PendingParser>,
}

impl<P> Default for InferenceStack<P> {
    fn default() -> Self {
        Self {
            parsers: IndexMap::new(),
            pending: Vec::new(),
        }
    }
}

impl<P> fmt::Debug for InferenceStack<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceStack")
            .field("stack", &self.parsers.keys().collect::<Vec<_>>())
            .field(
                "pending",
                &self
                    .pending
                    .iter()
                    .map(|pending| pending.reference.ref_name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<P: HasRefName> InferenceStack<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a parser on top of the stack.
    ///
    /// An existing parser with the same name is kept unless `allow_override`
    /// is set, in which case it is replaced at its current position.
    pub fn add(&mut self, parser: P, allow_override: bool) -> &P {
        let name = parser.ref_name().to_string();
        match self.parsers.get_index_of(&name) {
            Some(index) => {
                if allow_override {
                    self.parsers[index] = parser;
                } else {
                    warn!(ref_name = name.as_str(); "Parser already on the stack, keeping existing");
                }
                &self.parsers[index]
            }
            None => {
                debug!(ref_name = name.as_str(); "Parser added to the stack");
                let (index, _) = self.parsers.insert_full(name, parser);
                &self.parsers[index]
            }
        }
    }

    /// Insert a parser at `index`, shifting later parsers down.
    ///
    /// Returns `Ok(false)` without changes when the name is already present.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::StackIndexOutOfRange`] when `index` is
    /// greater than the stack length.
    pub fn add_at(&mut self, parser: P, index: usize) -> Result<bool, InferenceError> {
        let name = parser.ref_name().to_string();
        if self.parsers.contains_key(&name) {
            return Ok(false);
        }
        if index > self.parsers.len() {
            let err = InferenceError::StackIndexOutOfRange {
                ref_name: name,
                index,
                len: self.parsers.len(),
            };
            error!(err:%; "Cannot insert parser");
            return Err(err);
        }
        self.parsers.shift_insert(index, name, parser);
        Ok(true)
    }

    /// Remove a parser. Returns `true` if it existed.
    pub fn remove(&mut self, ref_name: &str) -> bool {
        if self.parsers.shift_remove(ref_name).is_some() {
            true
        } else {
            warn!(ref_name; "Parser not found to remove, ignoring");
            false
        }
    }

    pub fn get(&self, ref_name: &str) -> Option<&P> {
        self.parsers.get(ref_name)
    }

    pub fn has(&self, ref_name: &str) -> bool {
        self.parsers.contains_key(ref_name)
    }

    /// Parser names in stack order.
    pub fn stack(&self) -> Vec<&str> {
        self.parsers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Parsers in stack order.
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.parsers.values()
    }

    /// Return the first `Some` produced by `f`, trying parsers in stack order.
    pub fn infer<T>(&self, f: impl FnMut(&P) -> Option<T>) -> Option<T> {
        self.parsers.values().find_map(f)
    }

    /// Replace the stack order.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::StackMismatch`] unless `names` lists every
    /// parser on the stack exactly once. The order is unchanged on error.
    pub fn reorder(&mut self, names: &[&str]) -> Result<(), InferenceError> {
        let mut positions = Vec::with_capacity(names.len());
        for name in names {
            match self.parsers.get_index_of(*name) {
                Some(index) if !positions.contains(&index) => positions.push(index),
                _ => {
                    warn!(ref_name = *name; "Inference parser was not previously loaded");
                    return Err(self.mismatch(names));
                }
            }
        }
        if positions.len() != self.parsers.len() {
            return Err(self.mismatch(names));
        }

        let mut old = std::mem::take(&mut self.parsers)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        for index in positions {
            if let Some((name, parser)) = old[index].take() {
                self.parsers.insert(name, parser);
            }
        }
        Ok(())
    }

    /// Queue a parser to be loaded by [`resolve`](Self::resolve).
    ///
    /// With `index` the loaded parser is inserted there, otherwise it is
    /// pushed on top or replaces a parser of the same name in place.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Reference`] for a malformed reference.
    pub fn enqueue(
        &mut self,
        reference: ModuleReference,
        index: Option<usize>,
    ) -> Result<(), InferenceError> {
        reference.validate()?;
        self.pending.push(PendingParser { reference, index });
        Ok(())
    }

    /// Names of parsers waiting to be loaded, in queue order.
    pub fn pending(&self) -> Vec<&str> {
        self.pending
            .iter()
            .map(|pending| pending.reference.ref_name())
            .collect()
    }

    fn mismatch(&self, names: &[&str]) -> InferenceError {
        InferenceError::StackMismatch {
            requested: names.iter().map(|name| name.to_string()).collect(),
            existing: self.parsers.keys().cloned().collect(),
        }
    }

    /// Check queued insert positions against the stack as it will grow.
    fn check_positions(&self) -> Result<(), InferenceError> {
        let mut names: Vec<&str> = self.stack();
        for pending in &self.pending {
            let name = pending.reference.ref_name();
            if names.contains(&name) {
                continue;
            }
            match pending.index {
                Some(index) if index > names.len() => {
                    return Err(InferenceError::StackIndexOutOfRange {
                        ref_name: name.to_string(),
                        index,
                        len: names.len(),
                    });
                }
                Some(index) => names.insert(index, name),
                None => names.push(name),
            }
        }
        Ok(())
    }
}

impl<P> InferenceStack<P>
where
    P: HasRefName + Send + Sync,
{
    /// Load every queued parser and place it on the stack.
    ///
    /// All loads run before anything is placed. Returns the number of
    /// parsers loaded.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Resolve`] listing every failed load, or
    /// [`InferenceError::StackIndexOutOfRange`] for a queued position that
    /// does not fit. The stack and the queue are unchanged on error.
    pub async fn resolve<L>(&mut self, loader: &L) -> Result<usize, InferenceError>
    where
        L: Loader<P> + ?Sized,
    {
        if self.pending.is_empty() {
            return Ok(0);
        }
        self.check_positions()?;

        let mut loaded = Vec::with_capacity(self.pending.len());
        let mut failures = Vec::new();
        for pending in &self.pending {
            let ref_name = pending.reference.ref_name().to_string();
            match loader.load(pending.reference.spec()).await {
                Ok(parser) if parser.ref_name() == ref_name => loaded.push(parser),
                Ok(_) => failures.push(LoadFailure {
                    error: LoadError::Validation {
                        ref_name: ref_name.clone(),
                    },
                    ref_name,
                }),
                Err(error) => failures.push(LoadFailure { ref_name, error }),
            }
        }
        if !failures.is_empty() {
            let err = InferenceError::Resolve { failures };
            error!(err:%; "Inference stack resolution failed");
            return Err(err);
        }

        let pending = std::mem::take(&mut self.pending);
        let count = loaded.len();
        for (entry, parser) in pending.into_iter().zip(loaded) {
            match entry.index {
                Some(index) => {
                    self.add_at(parser, index)?;
                }
                None => {
                    self.add(parser, true);
                }
            }
        }
        debug!(count; "Inference stack resolved");
        Ok(count)
    }
}
