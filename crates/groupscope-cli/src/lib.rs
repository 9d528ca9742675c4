//! CLI logic for the Groupscope grouping tool.
//!
//! The input text is parsed in a `Document` scope whose parent, the root
//! scope, holds the standard and configured components. Leaves are
//! recognized by the [standard recognizer stack](recognizers::LeafParser::standard)
//! and the resolved grouping is printed as an indented tree.

pub mod catalog;
pub mod error_adapter;
pub mod recognizers;
pub mod render;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{info, warn};

use groupscope::{
    GroupingBuilder, GroupscopeError, bootstrap_components, config::AppConfig, scope::ScopeTree,
};

use catalog::{COMPONENTS, builtin_loader, standard_components};
use recognizers::LeafParser;
use render::Rendered;

/// Run the Groupscope CLI application
///
/// Reads the input file, processes it and writes the rendered tree to the
/// output file, or to stdout when no output path is given.
///
/// # Errors
///
/// Returns `GroupscopeError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Resolution errors
pub fn run(args: &Args) -> Result<(), GroupscopeError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing input"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let rendered = runtime.block_on(process(&source, app_config))?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(output_file = path; "Tree written");
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Parse and resolve `source`, returning the rendered tree.
///
/// # Errors
///
/// Returns [`GroupscopeError::Config`] for an invalid grammar or component,
/// [`GroupscopeError::Parse`] for invalid input and
/// [`GroupscopeError::Resolve`] when a component fails to load.
pub async fn process(source: &str, config: AppConfig) -> Result<String, GroupscopeError> {
    let mut tree = ScopeTree::with_slots([COMPONENTS]);
    let root = tree.create_scope(None, "Root");
    bootstrap_components(&mut tree, root, COMPONENTS, &standard_components())?;
    bootstrap_components(&mut tree, root, COMPONENTS, config.components())?;
    let document = tree.create_scope(Some(root), "Document");

    let leaves = LeafParser::standard()
        .await
        .map_err(|err| GroupscopeError::Config(format!("recognizers: {err}")))?;
    let builder = GroupingBuilder::new(config)?;

    let outcome = builder
        .parse_and_resolve(source, &leaves, &mut tree, document, &builtin_loader())
        .await?;

    for diagnostic in &outcome.diagnostics {
        warn!(code:? = diagnostic.code(); "{}", diagnostic.message());
    }

    Ok(Rendered::new(&outcome, &tree, document).to_string())
}

#[cfg(test)]
mod tests {
    use groupscope::config::{ComponentConfig, GrammarConfig};
    use groupscope::reference::ModuleReferenceConfig;

    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_process_standard_components() {
        let rendered = block_on(process("@true or (1.5 and \"hi\")", AppConfig::default())).unwrap();
        assert_eq!(
            rendered,
            "and group\n  and component true = true\n  or group\n    and number 1.5\n    and text \"hi\"\n"
        );
    }

    #[test]
    fn test_process_loads_builtin_on_demand() {
        let rendered = block_on(process("@pi or @pi", AppConfig::default())).unwrap();
        let expected = format!(
            "and group\n  and component pi = {pi}\n  or component pi = {pi}\n",
            pi = std::f64::consts::PI
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_process_configured_component_overrides_standard() {
        let component = ComponentConfig::new(ModuleReferenceConfig {
            ref_name: "true".to_string(),
            module: catalog::BUILTIN.to_string(),
            function: Some("text".to_string()),
            params: vec!["yes".to_string()],
            ..Default::default()
        })
        .with_override(true);
        let config = AppConfig::new(GrammarConfig::default(), vec![component]);

        let rendered = block_on(process("@true", config)).unwrap();
        assert_eq!(rendered, "and group\n  and component true = \"yes\"\n");
    }

    #[test]
    fn test_process_unknown_builtin_fails_to_resolve() {
        let err = block_on(process("@nothing", AppConfig::default())).unwrap_err();
        assert!(matches!(err, GroupscopeError::Resolve(_)), "{err}");
    }

    #[test]
    fn test_process_rejects_deep_nesting() {
        let source = format!("{}1", "(".repeat(10_000));
        let err = block_on(process(&source, AppConfig::default())).unwrap_err();

        let code = match &err {
            GroupscopeError::Parse { err, .. } => err.fatal().and_then(|fatal| fatal.code()),
            other => panic!("Expected a parse error, got: {other}"),
        };
        assert_eq!(
            code,
            Some(groupscope::diagnostic::ErrorCode::E105)
        );
    }

    #[test]
    fn test_process_parse_error() {
        let err = block_on(process("1 2", AppConfig::default())).unwrap_err();
        assert!(matches!(err, GroupscopeError::Parse { .. }), "{err}");
    }
}
