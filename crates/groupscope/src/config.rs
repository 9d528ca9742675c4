//! Configuration types for grouping parsers.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so
//! an empty document is a valid configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the grammar and the
//!   components to bootstrap.
//! - [`GrammarConfig`] - Operators, end conditions and the grouping policy.
//! - [`ComponentConfig`] - A module reference to load into a scope.
//!
//! # Example
//!
//! ```
//! # use groupscope::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.grammar().operators(), ["and", "or"]);
//! assert!(!config.grammar().strict_grouping());
//! ```

use serde::Deserialize;

use groupscope_core::{
    error::LoadError,
    reference::{ModuleReference, ModuleReferenceConfig},
    scope::{AddOptions, PendingResolution},
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Grammar section.
    #[serde(default)]
    grammar: GrammarConfig,

    /// Components to bootstrap, in load order.
    #[serde(default)]
    components: Vec<ComponentConfig>,
}

impl AppConfig {
    /// Creates a new [`AppConfig`].
    ///
    /// # Arguments
    ///
    /// * `grammar` - Operators, end conditions and grouping policy.
    /// * `components` - Module references to bootstrap.
    pub fn new(grammar: GrammarConfig, components: Vec<ComponentConfig>) -> Self {
        Self {
            grammar,
            components,
        }
    }

    /// Returns the grammar configuration.
    pub fn grammar(&self) -> &GrammarConfig {
        &self.grammar
    }

    /// Returns the configured components.
    pub fn components(&self) -> &[ComponentConfig] {
        &self.components
    }
}

/// Grammar and grouping policy.
#[derive(Debug, Clone, Deserialize)]
pub struct GrammarConfig {
    /// Operator tokens, matched in list order.
    #[serde(default = "default_operators")]
    operators: Vec<String>,

    /// Operator of the first item of a group when none is written.
    #[serde(default = "default_operator")]
    default_operator: String,

    /// Regular expressions that end every open group.
    #[serde(default)]
    end_conditions: Vec<String>,

    /// Treat unterminated groups and unbalanced `)` as errors.
    #[serde(default)]
    strict_grouping: bool,
}

fn default_operators() -> Vec<String> {
    vec!["and".to_string(), "or".to_string()]
}

fn default_operator() -> String {
    "and".to_string()
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            operators: default_operators(),
            default_operator: default_operator(),
            end_conditions: Vec::new(),
            strict_grouping: false,
        }
    }
}

impl GrammarConfig {
    /// Creates a grammar configuration without end conditions.
    pub fn new(operators: Vec<String>, default_operator: impl Into<String>) -> Self {
        Self {
            operators,
            default_operator: default_operator.into(),
            end_conditions: Vec::new(),
            strict_grouping: false,
        }
    }

    /// Add an end condition pattern.
    pub fn with_end_condition(mut self, pattern: impl Into<String>) -> Self {
        self.end_conditions.push(pattern.into());
        self
    }

    pub fn with_strict_grouping(mut self, strict: bool) -> Self {
        self.strict_grouping = strict;
        self
    }

    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    pub fn default_operator(&self) -> &str {
        &self.default_operator
    }

    /// Returns the end condition sources, uncompiled.
    pub fn end_conditions(&self) -> &[String] {
        &self.end_conditions
    }

    pub fn strict_grouping(&self) -> bool {
        self.strict_grouping
    }
}

/// A component loaded by module reference.
///
/// Deserializes from a flat table:
///
/// ```toml
/// [[components]]
/// ref_name = "red"
/// module = "builtin"
/// function = "color"
/// params = ["ff0000"]
/// override = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentConfig {
    #[serde(flatten)]
    reference: ModuleReferenceConfig,

    /// Promote the loaded component to the furthest ancestor defining it.
    #[serde(default, rename = "override")]
    override_ancestors: bool,

    /// Purge same-named entries from every descendant scope.
    #[serde(default)]
    override_down: bool,
}

impl ComponentConfig {
    pub fn new(reference: ModuleReferenceConfig) -> Self {
        Self {
            reference,
            override_ancestors: false,
            override_down: false,
        }
    }

    pub fn with_override(mut self, value: bool) -> Self {
        self.override_ancestors = value;
        self
    }

    pub fn with_override_down(mut self, value: bool) -> Self {
        self.override_down = value;
        self
    }

    pub fn reference(&self) -> &ModuleReferenceConfig {
        &self.reference
    }

    pub fn ref_name(&self) -> &str {
        &self.reference.ref_name
    }

    pub fn options(&self) -> AddOptions {
        AddOptions::new()
            .with_override(self.override_ancestors)
            .with_override_down(self.override_down)
    }

    /// Build the pending load for `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ConflictingFactory`] when both a function and a
    /// constructor are named.
    pub fn to_pending<C>(&self, slot: &str) -> Result<PendingResolution<C>, LoadError> {
        let reference = ModuleReference::try_from(&self.reference)?;
        Ok(PendingResolution::new(reference, slot).with_options(self.options()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.grammar().operators(), ["and", "or"]);
        assert_eq!(config.grammar().default_operator(), "and");
        assert!(config.grammar().end_conditions().is_empty());
        assert!(config.components().is_empty());
    }

    #[test]
    fn test_full_document() {
        let config: AppConfig = toml::from_str(
            r#"
            [grammar]
            operators = ["&&", "||"]
            default_operator = "&&"
            end_conditions = ["^;"]
            strict_grouping = true

            [[components]]
            ref_name = "red"
            module = "builtin"
            function = "color"
            params = ["ff0000"]
            override = true

            [[components]]
            ref_name = "answer"
            module = "builtin"
            "#,
        )
        .unwrap();

        let grammar = config.grammar();
        assert_eq!(grammar.operators(), ["&&", "||"]);
        assert_eq!(grammar.end_conditions(), ["^;"]);
        assert!(grammar.strict_grouping());

        let components = config.components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].ref_name(), "red");
        assert_eq!(components[0].reference().params, ["ff0000"]);
        assert!(components[0].options().override_ancestors);
        assert!(!components[1].options().override_ancestors);
    }

    #[test]
    fn test_conflicting_factory_names() {
        let component = ComponentConfig::new(ModuleReferenceConfig {
            ref_name: "x".to_string(),
            module: "builtin".to_string(),
            function: Some("f".to_string()),
            constructor: Some("C".to_string()),
            params: Vec::new(),
        });

        let err = component.to_pending::<u32>("components").unwrap_err();
        assert!(matches!(err, LoadError::ConflictingFactory { .. }));
    }
}
