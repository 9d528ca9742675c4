//! Groupscope - operator grouping with scoped, deferred component resolution.
//!
//! Text made of fragments joined by operators, with parentheses for nesting,
//! is parsed into a tree. Fragment meaning is delegated to a caller-supplied
//! [`FragmentParser`], which may queue component loads in a scope. The loads
//! run afterwards in a single asynchronous resolution pass.

pub mod config;

mod error;

pub use groupscope_core::{
    LoadError, LoadFailure, ResolveError, ScopeError, loader, reference, registry, scope,
};
pub use groupscope_parser::{
    EndCondition, Fragment, FragmentOutcome, FragmentParser, Grammar, Grouping,
    MAX_NESTING_DEPTH, Node, ParseOutcome, Span, error as diagnostic, inference,
};

pub use error::GroupscopeError;

use log::{debug, info, trace, warn};
use regex::Regex;

use groupscope_core::{
    loader::Loader,
    scope::{ScopeId, ScopeTree},
};
use groupscope_parser::{
    GroupingParser,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
};

use config::{AppConfig, ComponentConfig, GrammarConfig};

/// Builder for parsing groupings with a configured grammar.
///
/// # Examples
///
/// ```
/// use groupscope::{
///     FragmentOutcome, FragmentParser, GroupingBuilder,
///     config::AppConfig,
///     diagnostic::Diagnostic,
///     scope::{ScopeId, ScopeTree},
/// };
///
/// struct Letters;
///
/// impl FragmentParser<()> for Letters {
///     type Reference = char;
///
///     fn parse<'i>(
///         &self,
///         text: &'i str,
///         _tree: &mut ScopeTree<()>,
///         _scope: ScopeId,
///     ) -> Result<FragmentOutcome<'i, char>, Diagnostic> {
///         let mut chars = text.chars();
///         match chars.next() {
///             Some(c) if c.is_alphabetic() => Ok(FragmentOutcome::new(chars.as_str(), c)),
///             _ => Err(Diagnostic::error("expected a letter")),
///         }
///     }
/// }
///
/// let builder = GroupingBuilder::new(AppConfig::default()).unwrap();
/// let mut tree = ScopeTree::new();
/// let root = tree.create_scope(None, "Root");
///
/// let outcome = builder.parse("x or (y and z)", &Letters, &mut tree, root).unwrap();
/// assert_eq!(outcome.grouping.unwrap().fragments().len(), 3);
/// ```
#[derive(Debug)]
pub struct GroupingBuilder {
    config: AppConfig,
    grammar: Grammar<String>,
}

impl Default for GroupingBuilder {
    fn default() -> Self {
        let config = AppConfig::default();
        let grammar = Grammar::new(
            config.grammar().operators().to_vec(),
            config.grammar().default_operator().to_string(),
        );
        Self { config, grammar }
    }
}

impl GroupingBuilder {
    /// Create a builder, compiling the configured grammar.
    ///
    /// # Errors
    ///
    /// Returns [`GroupscopeError::Config`] for an empty default operator or
    /// an end condition that is not a valid regular expression.
    pub fn new(config: AppConfig) -> Result<Self, GroupscopeError> {
        let grammar = compile_grammar(config.grammar())?;
        debug!(
            operators = grammar.operators().len(),
            end_conditions = grammar.end_conditions().len();
            "Grammar compiled"
        );
        Ok(Self { config, grammar })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn grammar(&self) -> &Grammar<String> {
        &self.grammar
    }

    /// Parse `source` in `scope`.
    ///
    /// Module loads queued by the fragment parser stay pending. Groups left
    /// open (E101) and an unbalanced `)` (E102) are reported as warnings, or
    /// as errors when the grammar is configured with strict grouping.
    ///
    /// # Errors
    ///
    /// Returns [`GroupscopeError::Parse`] carrying every diagnostic emitted
    /// up to and including the fatal one.
    pub fn parse<'i, C, F>(
        &self,
        source: &'i str,
        fragment_parser: F,
        tree: &mut ScopeTree<C>,
        scope: ScopeId,
    ) -> Result<ParseOutcome<'i, String, F::Reference>, GroupscopeError>
    where
        F: FragmentParser<C>,
    {
        info!(scope:% = scope; "Parsing grouping");

        let outcome = GroupingParser::new(fragment_parser)
            .parse(source, tree, scope, &self.grammar, None)
            .map_err(|err| GroupscopeError::new_parse_error(err, source))?;
        let outcome = self.check_balance(source, outcome)?;

        debug!(
            diagnostics = outcome.diagnostics.len(),
            remaining = outcome.remaining.len();
            "Grouping parsed"
        );
        Ok(outcome)
    }

    /// Parse `source`, then resolve every pending load of the hierarchy
    /// containing `scope`.
    ///
    /// The outcome is returned only once resolution has succeeded, so every
    /// reference in it can be looked up in the tree.
    ///
    /// # Errors
    ///
    /// Returns [`GroupscopeError::Parse`] as [`parse`](Self::parse) does and
    /// [`GroupscopeError::Resolve`] when a load fails.
    pub async fn parse_and_resolve<'i, C, F, L>(
        &self,
        source: &'i str,
        fragment_parser: F,
        tree: &mut ScopeTree<C>,
        scope: ScopeId,
        loader: &L,
    ) -> Result<ParseOutcome<'i, String, F::Reference>, GroupscopeError>
    where
        C: Send + Sync,
        F: FragmentParser<C>,
        L: Loader<C> + ?Sized,
    {
        let outcome = self.parse(source, fragment_parser, tree, scope)?;

        let root = tree.root_of(scope);
        let report = tree.resolve(root, loader).await?;
        info!(
            scopes = report.visited.len(),
            registered = report.registered;
            "Grouping resolved"
        );
        Ok(outcome)
    }

    fn check_balance<'i, R>(
        &self,
        source: &'i str,
        mut outcome: ParseOutcome<'i, String, R>,
    ) -> Result<ParseOutcome<'i, String, R>, GroupscopeError> {
        let strict = self.config.grammar().strict_grouping();
        let consumed = &source[..source.len() - outcome.remaining.len()];
        let report = |message: String| {
            if strict {
                Diagnostic::error(message)
            } else {
                Diagnostic::warning(message)
            }
        };

        let mut collector = DiagnosticCollector::new();
        collector.extend(std::mem::take(&mut outcome.diagnostics));

        if outcome.unclosed_groups > 0 {
            let end = consumed.len();
            trace!(unclosed_groups = outcome.unclosed_groups, strict; "Unterminated grouping");
            collector.emit(
                report(format!(
                    "{} group(s) not closed",
                    outcome.unclosed_groups
                ))
                .with_code(ErrorCode::E101)
                .with_label(Span::new(end..end), "groups end here")
                .with_help("add `)` to close each group"),
            );
        }

        if outcome.has_unbalanced_close() {
            let position = consumed.rfind(')').unwrap_or(consumed.len());
            trace!(position, strict; "Unbalanced closing parenthesis");
            collector.emit(
                report("unbalanced closing parenthesis".to_string())
                    .with_code(ErrorCode::E102)
                    .with_label(Span::new(position..position + 1), "no group to close")
                    .with_help("remove the `)` or add a matching `(`"),
            );
        }

        match collector.finish() {
            Ok(diagnostics) => {
                if diagnostics.iter().any(|d| d.severity().is_warning()) {
                    warn!(diagnostics = diagnostics.len(); "Grouping parsed with warnings");
                }
                outcome.diagnostics = diagnostics;
                Ok(outcome)
            }
            Err(err) => Err(GroupscopeError::new_parse_error(err, source)),
        }
    }
}

/// Queue the configured components for loading into `slot` of `scope`.
///
/// The components are loaded by the next resolution of the scope, in list
/// order. Returns the number of components queued.
///
/// # Errors
///
/// Returns [`GroupscopeError::Config`] for a malformed component and
/// [`GroupscopeError::Scope`] when `scope` has no such slot. Nothing is
/// queued on error.
pub fn bootstrap_components<C>(
    tree: &mut ScopeTree<C>,
    scope: ScopeId,
    slot: &str,
    components: &[ComponentConfig],
) -> Result<usize, GroupscopeError> {
    if !tree.has_slot(scope, slot) {
        return Err(ScopeError::UnknownSlot {
            scope: tree.name(scope).to_string(),
            slot: slot.to_string(),
        }
        .into());
    }

    let pending = components
        .iter()
        .map(|component| {
            let pending = component.to_pending(slot).map_err(|err| {
                GroupscopeError::Config(format!("component `{}`: {err}", component.ref_name()))
            })?;
            pending
                .reference()
                .validate()
                .map_err(|err| GroupscopeError::Config(err.to_string()))?;
            Ok(pending)
        })
        .collect::<Result<Vec<_>, GroupscopeError>>()?;

    let count = pending.len();
    for entry in pending {
        tree.enqueue(scope, entry)?;
    }
    debug!(scope = tree.name(scope), count; "Components bootstrapped");
    Ok(count)
}

fn compile_grammar(config: &GrammarConfig) -> Result<Grammar<String>, GroupscopeError> {
    if config.default_operator().trim().is_empty() {
        return Err(GroupscopeError::Config(
            "default operator must not be empty".to_string(),
        ));
    }

    let end_conditions = config
        .end_conditions()
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|err| {
                GroupscopeError::Config(format!("invalid end condition `{pattern}`: {err}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Grammar::new(
        config.operators().to_vec(),
        config.default_operator().to_string(),
    )
    .with_end_conditions(end_conditions))
}
