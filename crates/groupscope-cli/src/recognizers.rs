//! Leaf recognizers for the CLI grammar.
//!
//! A fragment is recognized by the first [`Recognizer`] on the inference
//! stack that accepts it. The standard stack, loaded by name from the
//! `recognizers` module, is:
//!
//! 1. `number` - a decimal number such as `42`, `-1.5` or `2e3`
//! 2. `quoted` - text between double quotes
//! 3. `component` - `@name`, a component looked up in scope
//! 4. `word` - any run of letters, digits, `_` and `-`

use log::trace;
use winnow::{
    Parser as _,
    ascii::float,
    combinator::{delimited, peek, preceded},
    error::ModalResult,
    token::{one_of, take_till, take_while},
};

use groupscope::{
    FragmentOutcome, FragmentParser, Span,
    diagnostic::{Diagnostic, ErrorCode},
    inference::{HasRefName, InferenceError, InferenceStack},
    loader::FactoryLoader,
    reference::{LoaderSpec, ModuleReference},
    scope::{PendingResolution, ScopeId, ScopeTree},
};

use crate::catalog::{BUILTIN, COMPONENTS, Value};

/// Module name of the recognizer factories.
pub const RECOGNIZERS: &str = "recognizers";

/// Recognizer names in standard stack order.
pub const STANDARD_RECOGNIZERS: [&str; 4] = ["number", "quoted", "component", "word"];

/// What a fragment denotes.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Number(f64),
    Text(String),
    /// Name of a component in the `components` slot.
    Component(String),
    Word(String),
}

type Recognized<'i> = Option<Result<FragmentOutcome<'i, Leaf>, Diagnostic>>;

/// One way of reading a fragment.
pub trait Recognizer: HasRefName + Send + Sync {
    /// Returns `None` when `text` does not start with this kind of leaf, and
    /// an error when it does but is malformed.
    fn recognize<'i>(
        &self,
        text: &'i str,
        tree: &mut ScopeTree<Value>,
        scope: ScopeId,
    ) -> Recognized<'i>;
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn at_boundary(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with(')')
}

fn number(input: &mut &str) -> ModalResult<f64> {
    preceded(peek(one_of(('0'..='9', '+', '-', '.'))), float).parse_next(input)
}

fn quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited('"', take_till(0.., '"'), '"').parse_next(input)
}

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., is_name_char).parse_next(input)
}

#[derive(Debug)]
pub struct NumberRecognizer;

impl HasRefName for NumberRecognizer {
    fn ref_name(&self) -> &str {
        "number"
    }
}

impl Recognizer for NumberRecognizer {
    fn recognize<'i>(&self, text: &'i str, _: &mut ScopeTree<Value>, _: ScopeId) -> Recognized<'i> {
        let mut input = text;
        let value = number.parse_next(&mut input).ok()?;
        at_boundary(input).then(|| Ok(FragmentOutcome::new(input, Leaf::Number(value))))
    }
}

#[derive(Debug)]
pub struct QuotedRecognizer;

impl HasRefName for QuotedRecognizer {
    fn ref_name(&self) -> &str {
        "quoted"
    }
}

impl Recognizer for QuotedRecognizer {
    fn recognize<'i>(&self, text: &'i str, _: &mut ScopeTree<Value>, _: ScopeId) -> Recognized<'i> {
        if !text.starts_with('"') {
            return None;
        }
        let mut input = text;
        let recognized = match quoted.parse_next(&mut input) {
            Ok(body) => Ok(FragmentOutcome::new(input, Leaf::Text(body.to_string()))),
            Err(_) => Err(Diagnostic::error("unterminated quoted text")
                .with_code(ErrorCode::E104)
                .with_label(Span::new(0..1), "quote opened here")
                .with_help("close the text with `\"`")),
        };
        Some(recognized)
    }
}

/// `@name`. Names not yet visible from the scope are queued for loading
/// from the builtin module.
#[derive(Debug)]
pub struct ComponentRecognizer;

impl HasRefName for ComponentRecognizer {
    fn ref_name(&self) -> &str {
        "component"
    }
}

impl Recognizer for ComponentRecognizer {
    fn recognize<'i>(
        &self,
        text: &'i str,
        tree: &mut ScopeTree<Value>,
        scope: ScopeId,
    ) -> Recognized<'i> {
        let mut input = text.strip_prefix('@')?;
        let Ok(component) = name.parse_next(&mut input) else {
            return Some(Err(Diagnostic::error("expected a component name after `@`")
                .with_code(ErrorCode::E104)
                .with_label(Span::new(0..1), "component reference")));
        };

        if !is_known(tree, scope, component) {
            trace!(component; "Queueing builtin component");
            let reference = ModuleReference::new(
                component,
                LoaderSpec::new(BUILTIN).with_function(component),
            );
            if let Err(err) = tree.enqueue(scope, PendingResolution::new(reference, COMPONENTS)) {
                return Some(Err(Diagnostic::error(err.to_string())
                    .with_label(Span::new(0..text.len() - input.len()), "component reference")));
            }
        }
        Some(Ok(FragmentOutcome::new(
            input,
            Leaf::Component(component.to_string()),
        )))
    }
}

/// Returns `true` if `component` is registered or queued in `scope` or an
/// ancestor.
fn is_known(tree: &ScopeTree<Value>, scope: ScopeId, component: &str) -> bool {
    if tree.has_item(scope, component, COMPONENTS) {
        return true;
    }
    let mut current = Some(scope);
    while let Some(id) = current {
        if tree
            .pending(id)
            .iter()
            .any(|pending| pending.reference().ref_name() == component)
        {
            return true;
        }
        current = tree.parent(id);
    }
    false
}

#[derive(Debug)]
pub struct WordRecognizer;

impl HasRefName for WordRecognizer {
    fn ref_name(&self) -> &str {
        "word"
    }
}

impl Recognizer for WordRecognizer {
    fn recognize<'i>(&self, text: &'i str, _: &mut ScopeTree<Value>, _: ScopeId) -> Recognized<'i> {
        let mut input = text;
        let word = name.parse_next(&mut input).ok()?;
        Some(Ok(FragmentOutcome::new(input, Leaf::Word(word.to_string()))))
    }
}

/// The factory table of the `recognizers` module.
pub fn recognizer_loader() -> FactoryLoader<Box<dyn Recognizer>> {
    FactoryLoader::new()
        .with_function(RECOGNIZERS, "number", |_: &[String]| {
            Ok(Box::new(NumberRecognizer) as Box<dyn Recognizer>)
        })
        .with_function(RECOGNIZERS, "quoted", |_: &[String]| {
            Ok(Box::new(QuotedRecognizer) as Box<dyn Recognizer>)
        })
        .with_function(RECOGNIZERS, "component", |_: &[String]| {
            Ok(Box::new(ComponentRecognizer) as Box<dyn Recognizer>)
        })
        .with_function(RECOGNIZERS, "word", |_: &[String]| {
            Ok(Box::new(WordRecognizer) as Box<dyn Recognizer>)
        })
}

/// Fragment parser trying each recognizer of an inference stack in order.
pub struct LeafParser {
    stack: InferenceStack<Box<dyn Recognizer>>,
}

impl LeafParser {
    pub fn new(stack: InferenceStack<Box<dyn Recognizer>>) -> Self {
        Self { stack }
    }

    /// Load the standard recognizers by name.
    ///
    /// # Errors
    ///
    /// Returns an [`InferenceError`] if a recognizer fails to load.
    pub async fn standard() -> Result<Self, InferenceError> {
        let mut stack = InferenceStack::new();
        for recognizer in STANDARD_RECOGNIZERS {
            let spec = LoaderSpec::new(RECOGNIZERS).with_function(recognizer);
            stack.enqueue(ModuleReference::new(recognizer, spec), None)?;
        }
        stack.resolve(&recognizer_loader()).await?;
        Ok(Self::new(stack))
    }

    pub fn stack(&self) -> &InferenceStack<Box<dyn Recognizer>> {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut InferenceStack<Box<dyn Recognizer>> {
        &mut self.stack
    }
}

impl FragmentParser<Value> for LeafParser {
    type Reference = Leaf;

    fn parse<'i>(
        &self,
        text: &'i str,
        tree: &mut ScopeTree<Value>,
        scope: ScopeId,
    ) -> Result<FragmentOutcome<'i, Leaf>, Diagnostic> {
        match self
            .stack
            .infer(|recognizer| recognizer.recognize(text, tree, scope))
        {
            Some(recognized) => recognized,
            None => Err(Diagnostic::error("unrecognized fragment")
                .with_code(ErrorCode::E104)
                .with_help(format!(
                    "expected one of: {}",
                    self.stack.stack().join(", ")
                ))),
        }
    }
}
