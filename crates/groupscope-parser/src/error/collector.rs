//! Collector for accumulating diagnostics during a parse.
//!
//! The [`DiagnosticCollector`] gathers non-fatal messages while parsing
//! proceeds, so they can be returned with a successful result or carried
//! into the [`ParseError`] of a failed one.

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics.
///
/// # Example
///
/// ```
/// # use groupscope_parser::error::{Diagnostic, DiagnosticCollector, ErrorCode};
///
/// let mut collector = DiagnosticCollector::new();
/// collector.emit(Diagnostic::warning("empty group").with_code(ErrorCode::E103));
///
/// let err = collector.fail(Diagnostic::error("missing operator").with_code(ErrorCode::E100));
/// assert_eq!(err.diagnostics().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Emit several diagnostics in order.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Everything collected, whatever the severity.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Append `fatal` and turn everything collected into a [`ParseError`].
    pub fn fail(mut self, fatal: Diagnostic) -> ParseError {
        self.emit(fatal);
        ParseError::new(self.diagnostics)
    }

    /// Finish collection and return a result.
    ///
    /// - If an error was emitted, returns `Err(ParseError)` with all diagnostics.
    /// - Otherwise returns the collected warnings and informational messages.
    pub fn finish(self) -> Result<Vec<Diagnostic>, ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_collector_new_finish_ok() {
        let collector = DiagnosticCollector::new();
        assert!(collector.finish().unwrap().is_empty());
    }

    #[test]
    fn test_collector_emit_error_finish_err() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::error("test error"));

        assert!(collector.has_errors());
        assert!(collector.finish().is_err());
    }

    #[test]
    fn test_collector_keeps_warnings_on_success() {
        let mut collector = DiagnosticCollector::new();
        collector.extend([Diagnostic::warning("warning 1"), Diagnostic::info("info 1")]);

        let diagnostics = collector.finish().unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].message(), "warning 1");
    }

    #[test]
    fn test_collector_fail_appends_fatal_last() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("empty group").with_label(Span::new(2..4), "here"));

        let err = collector.fail(Diagnostic::error("missing operator").with_code(ErrorCode::E100));
        assert_eq!(err.diagnostics().len(), 2);
        assert_eq!(err.diagnostics()[1].code(), Some(ErrorCode::E100));
        assert_eq!(err.fatal().and_then(Diagnostic::code), Some(ErrorCode::E100));
    }
}
