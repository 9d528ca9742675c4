//! The core diagnostic type for the grouping error system.
//!
//! A [`Diagnostic`] represents a single message with a severity, an optional
//! error code, labeled source spans, help text and a free-form context
//! payload.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::Span,
};

/// A leveled message with source location information.
///
/// # Example
///
/// ```text
/// error[E100]: expected operator near `12345`
///   --> input.txt:1:12
///    |
///  1 | HelloWorld 12345
///    |            ^^^^^ operator missing before this item
///    |
///    = help: join items with one of: a, b, c, d
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    context: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use groupscope_parser::error::{Diagnostic, ErrorCode};
    /// # use groupscope_parser::Span;
    ///
    /// let diag = Diagnostic::error("fragment rejected")
    ///     .with_code(ErrorCode::E104)
    ///     .with_label(Span::new(0..3), "not a known item");
    /// assert!(diag.severity().is_error());
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Get the free-form context payload, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach a free-form payload, such as the offending reference name.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Turn spans relative to a fragment into spans relative to the source.
    ///
    /// A diagnostic without labels gets `fallback` as its primary label.
    pub(crate) fn anchored(mut self, offset: usize, fallback: Span) -> Self {
        if self.labels.is_empty() {
            self.labels.push(Label::primary(fallback, "here"));
            return self;
        }
        self.labels = self
            .labels
            .into_iter()
            .map(|label| label.shifted(offset))
            .collect();
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            context: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E100]: message" or "warning: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.context().is_none());
    }

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::warning("empty group")
            .with_code(ErrorCode::E103)
            .with_label(Span::new(4..6), "nothing inside")
            .with_secondary_label(Span::new(0..3), "in this group")
            .with_help("remove the parentheses")
            .with_context("depth=1");

        assert!(diag.severity().is_warning());
        assert_eq!(diag.code(), Some(ErrorCode::E103));
        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.primary_span(), Some(Span::new(4..6)));
        assert_eq!(diag.help(), Some("remove the parentheses"));
        assert_eq!(diag.context(), Some("depth=1"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("expected operator").with_code(ErrorCode::E100);
        assert_eq!(diag.to_string(), "error[E100]: expected operator");

        let diag = Diagnostic::info("loaded 3 components");
        assert_eq!(diag.to_string(), "info: loaded 3 components");
    }

    #[test]
    fn test_anchored_shifts_labels() {
        let diag = Diagnostic::error("bad")
            .with_label(Span::new(1..3), "here")
            .anchored(10, Span::new(10..20));
        assert_eq!(diag.primary_span(), Some(Span::new(11..13)));

        let diag = Diagnostic::error("bad").anchored(10, Span::new(10..20));
        assert_eq!(diag.primary_span(), Some(Span::new(10..20)));
    }
}
