//! Recursive descent over operator-joined fragments.
//!
//! [`GroupingParser::parse`] turns text such as `a or (b and c) << tail` into
//! a [`Grouping`] tree. Each nesting level is one stack frame. Between items
//! the parser expects an operator from the [`Grammar`], matched in list
//! order and followed by whitespace; only the first item of a group may omit
//! it, in which case the default operator is used. A `(` opens a sub-group
//! whose operator is the one just read. Everything else is handed to the
//! [`FragmentParser`].
//!
//! Parsing stops at one of three end conditions. A `)` is consumed and ends
//! only the innermost group. A caller pattern matching the remaining text
//! ends every open group and is left unconsumed. The end of the input ends
//! every open group as well.

use std::fmt;

use log::{debug, error, trace};
use regex::Regex;

use groupscope_core::scope::{ScopeId, ScopeTree};

use crate::{
    error::{self, Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    fragment::{FragmentOutcome, FragmentParser},
    grouping::{Fragment, Grouping},
    span::Span,
};

/// Deepest group nesting accepted by [`GroupingParser::parse`].
pub const MAX_NESTING_DEPTH: usize = 128;

/// Why a parse level stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndCondition {
    /// No end condition at this position.
    Noop,
    /// A `)` closed the innermost group and was consumed.
    CurrentGroupingEnd,
    /// A caller pattern matched. The matched text is not consumed.
    GroupingEnd,
    /// Only whitespace is left.
    InputEnd,
}

impl fmt::Display for EndCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndCondition::Noop => "no end",
            EndCondition::CurrentGroupingEnd => "current grouping end",
            EndCondition::GroupingEnd => "grouping end",
            EndCondition::InputEnd => "input end",
        };
        f.write_str(name)
    }
}

/// Operators and end conditions of one grouping language.
///
/// Operators are literal tokens tried in list order; the first one followed
/// by whitespace and more text wins. End conditions are regular expressions
/// tested against the remaining text with leading whitespace removed; anchor
/// them with `^` to only match at the current position.
///
/// # Examples
///
/// ```
/// use groupscope_parser::Grammar;
/// use regex::Regex;
///
/// let grammar = Grammar::new(vec!["and", "or"], "and")
///     .with_end_condition(Regex::new(r"^<<").unwrap());
/// assert_eq!(grammar.operators(), ["and", "or"]);
/// ```
#[derive(Debug, Clone)]
pub struct Grammar<Op> {
    operators: Vec<Op>,
    default_operator: Op,
    end_conditions: Vec<Regex>,
}

impl<Op> Grammar<Op>
where
    Op: AsRef<str> + Clone,
{
    pub fn new(operators: Vec<Op>, default_operator: Op) -> Self {
        Self {
            operators,
            default_operator,
            end_conditions: Vec::new(),
        }
    }

    /// Add an end condition pattern.
    pub fn with_end_condition(mut self, pattern: Regex) -> Self {
        self.end_conditions.push(pattern);
        self
    }

    /// Add several end condition patterns.
    pub fn with_end_conditions(mut self, patterns: impl IntoIterator<Item = Regex>) -> Self {
        self.end_conditions.extend(patterns);
        self
    }

    pub fn operators(&self) -> &[Op] {
        &self.operators
    }

    pub fn default_operator(&self) -> &Op {
        &self.default_operator
    }

    pub fn end_conditions(&self) -> &[Regex] {
        &self.end_conditions
    }

    /// Match an operator token at the start of `text`.
    ///
    /// Returns the operator and the text after it and its trailing
    /// whitespace. An operator followed only by whitespace does not match.
    pub fn match_operator<'i>(&self, text: &'i str) -> Option<(Op, &'i str)> {
        self.operators.iter().find_map(|operator| {
            let token = operator.as_ref();
            if token.is_empty() {
                return None;
            }
            let rest = text.strip_prefix(token)?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let rest = rest.trim_start();
            (!rest.is_empty()).then(|| (operator.clone(), rest))
        })
    }

    fn operator_list(&self) -> String {
        self.operators
            .iter()
            .map(|operator| operator.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result of a successful [`GroupingParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome<'i, Op, R> {
    /// Unconsumed suffix of the input.
    pub remaining: &'i str,
    /// `None` when an end condition came before any content.
    pub grouping: Option<Grouping<Op, R>>,
    /// The end condition that stopped the outermost level.
    pub end_condition: EndCondition,
    /// Warnings and other non-fatal messages, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of `(` groups that were ended by the input end or a caller
    /// pattern instead of a `)`.
    pub unclosed_groups: usize,
}

impl<Op, R> ParseOutcome<'_, Op, R> {
    /// Returns `true` if a `)` closed the outermost level, which means the
    /// input had more closing than opening parentheses.
    pub fn has_unbalanced_close(&self) -> bool {
        self.end_condition == EndCondition::CurrentGroupingEnd
    }
}

/// The recursive grouping parser.
///
/// The parser is stateless apart from its fragment parser and can be reused
/// for any number of inputs.
#[derive(Debug, Clone, Default)]
pub struct GroupingParser<F> {
    fragment_parser: F,
}

impl<F> GroupingParser<F> {
    pub fn new(fragment_parser: F) -> Self {
        Self { fragment_parser }
    }

    pub fn fragment_parser(&self) -> &F {
        &self.fragment_parser
    }

    /// Parse `text` into a grouping tree.
    ///
    /// The top-level grouping gets `group_operator`, or the grammar's default
    /// operator when `None`. Fragments are parsed against `scope`; any module
    /// loads they queue stay pending until the caller resolves the scope.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when an item after the first one in a group
    /// lacks an operator (E100) or when the fragment parser rejects the text
    /// (E104), or when groups nest deeper than [`MAX_NESTING_DEPTH`] (E105).
    /// The error carries every diagnostic emitted before the fatal one.
    pub fn parse<'i, C, Op>(
        &self,
        text: &'i str,
        tree: &mut ScopeTree<C>,
        scope: ScopeId,
        grammar: &Grammar<Op>,
        group_operator: Option<Op>,
    ) -> Result<ParseOutcome<'i, Op, F::Reference>, ParseError>
    where
        F: FragmentParser<C>,
        Op: AsRef<str> + Clone,
    {
        debug!(length = text.len(); "Parsing grouping");
        let mut run = ParseRun {
            source: text,
            tree,
            scope,
            grammar,
            fragment_parser: &self.fragment_parser,
            collector: DiagnosticCollector::new(),
        };

        match run.parse_level(text, group_operator, 0) {
            Ok(level) => {
                debug!(
                    end_condition:% = level.end_condition,
                    unclosed_groups = level.unclosed_groups;
                    "Grouping parsed"
                );
                Ok(ParseOutcome {
                    remaining: level.remaining,
                    grouping: level.grouping,
                    end_condition: level.end_condition,
                    diagnostics: run.collector.into_diagnostics(),
                    unclosed_groups: level.unclosed_groups,
                })
            }
            Err(fatal) => {
                error!(diagnostic:% = fatal; "Grouping parse failed");
                Err(run.collector.fail(fatal))
            }
        }
    }
}

struct Level<'i, Op, R> {
    remaining: &'i str,
    grouping: Option<Grouping<Op, R>>,
    end_condition: EndCondition,
    unclosed_groups: usize,
}

struct ParseRun<'a, 'i, C, F, Op> {
    source: &'i str,
    tree: &'a mut ScopeTree<C>,
    scope: ScopeId,
    grammar: &'a Grammar<Op>,
    fragment_parser: &'a F,
    collector: DiagnosticCollector,
}

impl<'i, C, F, Op> ParseRun<'_, 'i, C, F, Op>
where
    F: FragmentParser<C>,
    Op: AsRef<str> + Clone,
{
    fn parse_level(
        &mut self,
        text: &'i str,
        group_operator: Option<Op>,
        depth: usize,
    ) -> error::Result<Level<'i, Op, F::Reference>> {
        let (mut remaining, mut end_condition) = self.test_end_condition(text);
        if end_condition != EndCondition::Noop {
            trace!(depth, end_condition:%; "End condition before any content");
            return Ok(Level {
                remaining,
                grouping: None,
                end_condition,
                unclosed_groups: 0,
            });
        }

        let operator = group_operator.unwrap_or_else(|| self.grammar.default_operator.clone());
        let mut grouping = Grouping::new(operator);
        let mut unclosed_groups = 0;

        while !remaining.is_empty() {
            let (item_operator, rest) = self.parse_operator(remaining, grouping.is_empty())?;
            remaining = rest;

            if let Some(inner) = remaining.strip_prefix('(') {
                let open = self.offset(remaining);
                if depth >= MAX_NESTING_DEPTH {
                    return Err(Diagnostic::error("groups nested too deeply")
                        .with_code(ErrorCode::E105)
                        .with_label(Span::new(open..open + 1), "this group is too deep")
                        .with_help(format!(
                            "groups may nest at most {MAX_NESTING_DEPTH} levels"
                        )));
                }
                let sub = self.parse_level(inner, Some(item_operator), depth + 1)?;
                remaining = sub.remaining;
                end_condition = sub.end_condition;
                unclosed_groups += sub.unclosed_groups;

                match sub.grouping {
                    Some(sub_grouping) => grouping.push(sub_grouping),
                    None if end_condition == EndCondition::CurrentGroupingEnd => {
                        self.collector.emit(
                            Diagnostic::warning("empty group")
                                .with_code(ErrorCode::E103)
                                .with_label(Span::new(open..open + 1), "this group has no content")
                                .with_help("remove the parentheses or put an item inside"),
                        );
                    }
                    None => {}
                }

                if matches!(
                    end_condition,
                    EndCondition::GroupingEnd | EndCondition::InputEnd
                ) {
                    trace!(depth, open, end_condition:%; "Group left open");
                    unclosed_groups += 1;
                    break;
                }
            } else {
                let (rest, reference) = self.parse_fragment(remaining)?;
                grouping.push(Fragment::new(item_operator, reference));
                remaining = rest;
            }

            (remaining, end_condition) = self.test_end_condition(remaining);
            if end_condition != EndCondition::Noop {
                break;
            }
        }

        trace!(depth, items = grouping.len(), end_condition:%; "Level parsed");
        Ok(Level {
            remaining,
            grouping: (!grouping.is_empty()).then_some(grouping),
            end_condition,
            unclosed_groups,
        })
    }

    fn test_end_condition(&self, text: &'i str) -> (&'i str, EndCondition) {
        let text = text.trim_start();
        if text.is_empty() {
            return (text, EndCondition::InputEnd);
        }
        if let Some(rest) = text.strip_prefix(')') {
            return (rest.trim_start(), EndCondition::CurrentGroupingEnd);
        }
        if self
            .grammar
            .end_conditions
            .iter()
            .any(|pattern| pattern.is_match(text))
        {
            return (text, EndCondition::GroupingEnd);
        }
        (text, EndCondition::Noop)
    }

    fn parse_operator(&self, text: &'i str, first_item: bool) -> error::Result<(Op, &'i str)> {
        if let Some((operator, rest)) = self.grammar.match_operator(text) {
            trace!(operator = operator.as_ref(); "Matched operator");
            return Ok((operator, rest));
        }
        if first_item {
            trace!(
                operator = self.grammar.default_operator.as_ref();
                "Defaulting operator of first item"
            );
            return Ok((self.grammar.default_operator.clone(), text));
        }

        Err(Diagnostic::error(format!(
            "expected operator near `{}`",
            first_token(text)
        ))
        .with_code(ErrorCode::E100)
        .with_label(self.token_span(text), "operator missing before this item")
        .with_help(format!(
            "join items with one of: {}",
            self.grammar.operator_list()
        )))
    }

    fn parse_fragment(&mut self, text: &'i str) -> error::Result<(&'i str, F::Reference)> {
        let offset = self.offset(text);
        let fallback = self.token_span(text);

        let outcome = self
            .fragment_parser
            .parse(text, self.tree, self.scope)
            .map_err(|diagnostic| {
                let diagnostic = if diagnostic.code().is_none() {
                    diagnostic.with_code(ErrorCode::E104)
                } else {
                    diagnostic
                };
                diagnostic.anchored(offset, fallback)
            })?;

        let FragmentOutcome {
            remaining,
            reference,
            diagnostics,
        } = outcome;
        if remaining.len() >= text.len() || !text.ends_with(remaining) {
            return Err(Diagnostic::error("fragment parser made no progress")
                .with_code(ErrorCode::E104)
                .with_label(fallback, "fragment could not be consumed"));
        }

        self.collector.extend(
            diagnostics
                .into_iter()
                .map(|diagnostic| diagnostic.anchored(offset, fallback)),
        );
        Ok((remaining, reference))
    }

    /// Byte offset of `text` within the source. `text` is always a suffix.
    fn offset(&self, text: &str) -> usize {
        self.source.len() - text.len()
    }

    fn token_span(&self, text: &str) -> Span {
        let start = self.offset(text);
        Span::new(start..start + first_token(text).len())
    }
}

fn first_token(text: &str) -> &str {
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    &text[..end]
}
