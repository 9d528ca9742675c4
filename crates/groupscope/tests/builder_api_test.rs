//! Integration tests for the GroupingBuilder API

use groupscope::{
    FragmentOutcome, FragmentParser, GroupingBuilder, GroupscopeError, bootstrap_components,
    config::{AppConfig, ComponentConfig, GrammarConfig},
    diagnostic::{Diagnostic, ErrorCode, Severity},
    loader::FactoryLoader,
    reference::{LoaderSpec, ModuleReference, ModuleReferenceConfig},
    scope::{PendingResolution, ScopeId, ScopeTree},
};

const SLOT: &str = "components";

/// Words become references; `$word` is loaded from the `lengths` module.
struct Words;

impl FragmentParser<usize> for Words {
    type Reference = String;

    fn parse<'i>(
        &self,
        text: &'i str,
        tree: &mut ScopeTree<usize>,
        scope: ScopeId,
    ) -> Result<FragmentOutcome<'i, String>, Diagnostic> {
        let (deferred, body) = match text.strip_prefix('$') {
            Some(body) => (true, body),
            None => (false, text),
        };
        let end = body
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(body.len());
        if end == 0 {
            return Err(Diagnostic::error("expected a word"));
        }
        let word = &body[..end];

        if deferred {
            let reference = ModuleReference::new(
                word,
                LoaderSpec::new("lengths").with_function("of").with_param(word),
            );
            tree.enqueue(scope, PendingResolution::new(reference, SLOT))
                .map_err(|err| Diagnostic::error(err.to_string()))?;
        }
        Ok(FragmentOutcome::new(&body[end..], word.to_string()))
    }
}

fn loader() -> FactoryLoader<usize> {
    FactoryLoader::new()
        .with_function("lengths", "of", |params: &[String]| {
            params
                .first()
                .map(String::len)
                .ok_or_else(|| "missing word".to_string())
        })
        .with_default("constants", |params: &[String]| {
            params
                .first()
                .ok_or_else(|| "missing value".to_string())?
                .parse::<usize>()
                .map_err(|err| format!("{err}"))
        })
}

fn tree() -> (ScopeTree<usize>, ScopeId) {
    let mut tree = ScopeTree::with_slots([SLOT]);
    let root = tree.create_scope(None, "Root");
    (tree, root)
}

fn strict_builder() -> GroupingBuilder {
    let grammar = GrammarConfig::new(vec!["and".into(), "or".into()], "and")
        .with_strict_grouping(true);
    GroupingBuilder::new(AppConfig::new(grammar, Vec::new())).unwrap()
}

fn parse_error_codes(err: &GroupscopeError) -> Vec<Option<ErrorCode>> {
    match err {
        GroupscopeError::Parse { err, .. } => {
            err.diagnostics().iter().map(Diagnostic::code).collect()
        }
        other => panic!("Expected a parse error, got: {other}"),
    }
}

#[test]
fn test_builder_api_exists() {
    let _builder = GroupingBuilder::default();
}

#[test]
fn test_parse_simple_grouping() {
    let builder = GroupingBuilder::default();
    let (mut tree, root) = tree();

    let outcome = builder
        .parse("alpha or (beta and gamma)", &Words, &mut tree, root)
        .unwrap();

    let grouping = outcome.grouping.unwrap();
    assert_eq!(grouping.operator, "and");
    assert_eq!(grouping.len(), 2);
    assert_eq!(*grouping.group[1].operator(), "or");
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_configured_end_condition() {
    let grammar = GrammarConfig::new(vec!["&&".into(), "||".into()], "&&").with_end_condition("^;");
    let builder = GroupingBuilder::new(AppConfig::new(grammar, Vec::new())).unwrap();
    let (mut tree, root) = tree();

    let outcome = builder
        .parse("a && b || c; trailing", &Words, &mut tree, root)
        .unwrap();

    assert_eq!(outcome.remaining, "; trailing");
    assert_eq!(outcome.grouping.unwrap().len(), 3);
}

#[test]
fn test_invalid_end_condition_is_config_error() {
    let grammar = GrammarConfig::new(vec!["and".into()], "and").with_end_condition("^(");
    let err = GroupingBuilder::new(AppConfig::new(grammar, Vec::new())).unwrap_err();
    assert!(matches!(err, GroupscopeError::Config(_)), "{err}");
}

#[test]
fn test_parse_error_keeps_source() {
    let builder = GroupingBuilder::default();
    let (mut tree, root) = tree();

    let err = builder
        .parse("alpha beta", &Words, &mut tree, root)
        .unwrap_err();

    assert_eq!(parse_error_codes(&err), [Some(ErrorCode::E100)]);
    let GroupscopeError::Parse { src, .. } = err else {
        unreachable!();
    };
    assert_eq!(src, "alpha beta");
}

#[test]
fn test_unclosed_group_is_warning_by_default() {
    let builder = GroupingBuilder::default();
    let (mut tree, root) = tree();

    let outcome = builder
        .parse("alpha or (beta", &Words, &mut tree, root)
        .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    let warning = &outcome.diagnostics[0];
    assert_eq!(warning.severity(), Severity::Warning);
    assert_eq!(warning.code(), Some(ErrorCode::E101));
}

#[test]
fn test_unclosed_group_fails_when_strict() {
    let (mut tree, root) = tree();
    let err = strict_builder()
        .parse("alpha or (beta", &Words, &mut tree, root)
        .unwrap_err();
    assert_eq!(parse_error_codes(&err), [Some(ErrorCode::E101)]);
}

#[test]
fn test_unbalanced_close_fails_when_strict() {
    let (mut tree, root) = tree();
    let err = strict_builder()
        .parse("alpha) or beta", &Words, &mut tree, root)
        .unwrap_err();

    let GroupscopeError::Parse { err, .. } = err else {
        panic!("Expected a parse error");
    };
    let fatal = err.fatal().unwrap();
    assert_eq!(fatal.code(), Some(ErrorCode::E102));
    assert_eq!(fatal.primary_span().map(|span| span.start()), Some(5));
}

#[tokio::test]
async fn test_parse_and_resolve() {
    let builder = GroupingBuilder::default();
    let (mut tree, root) = tree();
    let document = tree.create_scope(Some(root), "Document");

    let outcome = builder
        .parse_and_resolve("$hello or $hi", &Words, &mut tree, document, &loader())
        .await
        .unwrap();

    let lengths: Vec<usize> = outcome
        .grouping
        .unwrap()
        .fragments()
        .iter()
        .filter_map(|fragment| tree.lookup(document, &fragment.reference, SLOT, true))
        .copied()
        .collect();
    assert_eq!(lengths, [5, 2]);
}

#[tokio::test]
async fn test_parse_and_resolve_reports_load_failure() {
    let builder = GroupingBuilder::default();
    let (mut tree, root) = tree();
    let loader = FactoryLoader::<usize>::new();

    let err = builder
        .parse_and_resolve("$hello", &Words, &mut tree, root, &loader)
        .await
        .unwrap_err();

    assert!(matches!(err, GroupscopeError::Resolve(_)), "{err}");
    assert_eq!(tree.pending(root).len(), 1);
}

fn constant(ref_name: &str, value: &str) -> ComponentConfig {
    ComponentConfig::new(ModuleReferenceConfig {
        ref_name: ref_name.to_string(),
        module: "constants".to_string(),
        params: vec![value.to_string()],
        ..Default::default()
    })
}

#[tokio::test]
async fn test_bootstrap_components() {
    let (mut tree, root) = tree();
    let document = tree.create_scope(Some(root), "Document");

    let queued = bootstrap_components(
        &mut tree,
        root,
        SLOT,
        &[constant("answer", "42"), constant("zero", "0")],
    )
    .unwrap();
    assert_eq!(queued, 2);

    tree.resolve(root, &loader()).await.unwrap();
    assert_eq!(tree.lookup(document, "answer", SLOT, true), Some(&42));
    assert_eq!(tree.lookup(document, "zero", SLOT, true), Some(&0));
}

#[test]
fn test_bootstrap_is_all_or_nothing() {
    let (mut tree, root) = tree();
    let mut broken = ModuleReferenceConfig {
        ref_name: "broken".to_string(),
        module: "constants".to_string(),
        ..Default::default()
    };
    broken.function = Some("f".to_string());
    broken.constructor = Some("C".to_string());

    let err = bootstrap_components(
        &mut tree,
        root,
        SLOT,
        &[constant("answer", "42"), ComponentConfig::new(broken)],
    )
    .unwrap_err();

    assert!(matches!(err, GroupscopeError::Config(_)), "{err}");
    assert!(tree.pending(root).is_empty());
}

#[test]
fn test_bootstrap_unknown_slot() {
    let (mut tree, root) = tree();
    let err = bootstrap_components(&mut tree, root, "missing", &[constant("a", "1")]).unwrap_err();
    assert!(matches!(err, GroupscopeError::Scope(_)), "{err}");
}

#[test]
fn test_builder_reusability() {
    let builder = GroupingBuilder::default();
    let (mut tree, root) = tree();

    for source in ["a", "a and b", "(a or b) and c"] {
        let outcome = builder.parse(source, &Words, &mut tree, root);
        assert!(outcome.is_ok(), "Should parse `{source}`: {:?}", outcome.err());
    }
}
