//! Miette reports for [`GroupscopeError`].
//!
//! A failed parse keeps the warnings emitted before its fatal diagnostic;
//! each of them becomes its own report over the input text. Other failures
//! become a single report with a `groupscope::*` code and, where the CLI can
//! tell what to look at, a hint.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use groupscope::{
    GroupscopeError, ResolveError, Span,
    diagnostic::{Diagnostic, Severity},
};

/// One grouping diagnostic over the input text.
pub struct SourceReport<'a> {
    diag: &'a Diagnostic,
    input: &'a str,
}

impl<'a> SourceReport<'a> {
    pub fn new(diag: &'a Diagnostic, input: &'a str) -> Self {
        Self { diag, input }
    }
}

impl fmt::Debug for SourceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.diag, f)
    }
}

impl fmt::Display for SourceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diag.message())
    }
}

impl std::error::Error for SourceReport<'_> {}

impl MietteDiagnostic for SourceReport<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(miette_severity(self.diag.severity()))
    }

    /// Help text, followed by the free-form context when there is one.
    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let text = match (self.diag.help(), self.diag.context()) {
            (Some(help), Some(context)) => format!("{help}\n{context}"),
            (Some(text), None) | (None, Some(text)) => text.to_string(),
            (None, None) => return None,
        };
        Some(Box::new(text))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.input as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let text = Some(label.message().to_string());
            let span = source_span(label.span());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(text, span)
            } else {
                LabeledSpan::new_with_span(text, span)
            }
        })))
    }
}

/// A failure outside the input text.
pub struct FailureReport<'a>(&'a GroupscopeError);

impl fmt::Debug for FailureReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

impl fmt::Display for FailureReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0, f)
    }
}

impl std::error::Error for FailureReport<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for FailureReport<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            GroupscopeError::Io(_) => "groupscope::io",
            GroupscopeError::Parse { .. } => return None,
            GroupscopeError::Resolve(_) => "groupscope::resolve",
            GroupscopeError::Scope(_) => "groupscope::scope",
            GroupscopeError::Config(_) => "groupscope::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let hint = match self.0 {
            GroupscopeError::Resolve(ResolveError::LoaderFailure { failures, .. }) => format!(
                "no builtin component named {}; check `@` references and the `[[components]]` table",
                failures
                    .iter()
                    .map(|failure| format!("`{}`", failure.ref_name))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            GroupscopeError::Resolve(ResolveError::UnresolvedReference { slot, .. }) => {
                format!("slot `{slot}` was removed before its pending loads were resolved")
            }
            GroupscopeError::Config(_) => {
                "check the `[grammar]` and `[[components]]` sections of the configuration file"
                    .to_string()
            }
            _ => return None,
        };
        Some(Box::new(hint))
    }
}

pub type Reportable<'a> = Box<dyn MietteDiagnostic + 'a>;

fn miette_severity(severity: Severity) -> MietteSeverity {
    match severity {
        Severity::Error => MietteSeverity::Error,
        Severity::Warning => MietteSeverity::Warning,
        Severity::Info => MietteSeverity::Advice,
    }
}

fn source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`GroupscopeError`] into a list of reportable errors.
///
/// A parse error yields one [`Reportable`] per diagnostic, in emission
/// order. Every other variant yields a single one.
pub fn to_reportables(err: &GroupscopeError) -> Vec<Reportable<'_>> {
    match err {
        GroupscopeError::Parse {
            err: parse_err,
            src,
        } => parse_err
            .diagnostics()
            .iter()
            .map(|d| Box::new(SourceReport::new(d, src)) as Reportable<'_>)
            .collect(),
        _ => vec![Box::new(FailureReport(err)) as Reportable<'_>],
    }
}

#[cfg(test)]
mod tests {
    use groupscope::{
        LoadError, LoadFailure,
        diagnostic::{ErrorCode, ParseError},
        scope::ScopeTree,
    };

    use super::*;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("expected operator near `beta`")
            .with_code(ErrorCode::E100)
            .with_label(Span::new(6..10), "operator missing before this item")
            .with_help("join items with one of: and, or");
        let err = GroupscopeError::new_parse_error(ParseError::from(diag), "alpha beta");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        let report = &reportables[0];
        assert_eq!(report.to_string(), "expected operator near `beta`");
        assert_eq!(report.code().map(|c| c.to_string()).as_deref(), Some("E100"));
        assert_eq!(report.severity(), Some(miette::Severity::Error));
        assert_eq!(report.labels().map(Iterator::count), Some(1));
    }

    #[test]
    fn test_warnings_and_fatal_rendered_separately() {
        let diags = vec![
            Diagnostic::warning("empty group")
                .with_code(ErrorCode::E103)
                .with_label(Span::new(0..1), "this group has no content"),
            Diagnostic::error("unrecognized fragment")
                .with_code(ErrorCode::E104)
                .with_label(Span::new(6..7), "here"),
        ];
        let err = GroupscopeError::new_parse_error(ParseError::from(diags), "() or *");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "empty group");
        assert_eq!(reportables[0].severity(), Some(miette::Severity::Warning));
        assert_eq!(reportables[1].to_string(), "unrecognized fragment");
    }

    #[test]
    fn test_non_parse_error() {
        let err = GroupscopeError::Config("bad grammar".to_string());

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert_eq!(reportables[0].to_string(), "Configuration error: bad grammar");
        assert_eq!(
            reportables[0].code().map(|c| c.to_string()).as_deref(),
            Some("groupscope::config")
        );
        assert!(reportables[0].help().is_some());
    }

    #[test]
    fn test_help_includes_context() {
        let diag = Diagnostic::error("unrecognized fragment")
            .with_code(ErrorCode::E104)
            .with_help("fragments start with a letter")
            .with_context("while parsing group 2");
        let report = SourceReport::new(&diag, "a or 1");

        assert_eq!(
            report.help().map(|h| h.to_string()).as_deref(),
            Some("fragments start with a letter\nwhile parsing group 2")
        );
    }

    #[test]
    fn test_info_maps_to_advice() {
        let diag = Diagnostic::info("2 groups parsed");
        let report = SourceReport::new(&diag, "a or b");

        assert_eq!(report.severity(), Some(miette::Severity::Advice));
        assert!(report.help().is_none());
        assert!(report.labels().is_none());
    }

    #[test]
    fn test_loader_failure_names_components() {
        let err = GroupscopeError::Resolve(ResolveError::LoaderFailure {
            scope: ScopeTree::<()>::new().create_scope(None, "Root"),
            scope_name: "Root".to_string(),
            failures: vec![
                LoadFailure {
                    ref_name: "title".to_string(),
                    error: LoadError::UnknownModule("rules.text".to_string()),
                },
                LoadFailure {
                    ref_name: "year".to_string(),
                    error: LoadError::UnknownModule("rules.date".to_string()),
                },
            ],
        });

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert_eq!(
            reportables[0].code().map(|c| c.to_string()).as_deref(),
            Some("groupscope::resolve")
        );
        let help = reportables[0].help().map(|h| h.to_string()).unwrap();
        assert!(help.contains("`title`, `year`"), "{help}");
    }

    #[test]
    fn test_io_error_has_no_help() {
        let err = GroupscopeError::Io(std::io::Error::other("disk gone"));

        let reportables = to_reportables(&err);
        assert!(reportables[0].help().is_none());
    }

    #[test]
    fn test_labels_keep_primary_flag() {
        let diag = Diagnostic::error("unbalanced closing parenthesis")
            .with_label(Span::new(5..6), "no group to close")
            .with_secondary_label(Span::new(0..1), "group opened here");
        let report = SourceReport::new(&diag, "(a b) c)");

        let labels: Vec<_> = report.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
        assert_eq!(labels[1].label(), Some("group opened here"));
    }
}
