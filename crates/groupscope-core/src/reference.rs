//! References to registrable components.
//!
//! A component enters a registry either already materialized, as an
//! [`InstanceReference`], or as a [`ModuleReference`] describing how to load it
//! by name. Both are keyed by a `ref_name` that is unique within one
//! [`RuleElementRegistry`](crate::registry::RuleElementRegistry).

use std::fmt;

use serde::Deserialize;

use crate::error::{LoadError, RegistryError};

/// How a module produces its component.
///
/// A module either exposes a default factory, a named constructor, or a named
/// factory function. Constructor and function are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FactoryName {
    /// The module's default factory.
    Default,
    /// A named constructor exported by the module.
    Constructor(String),
    /// A named factory function exported by the module.
    Function(String),
}

impl FactoryName {
    /// Returns the factory name, or `None` for the default factory.
    pub fn name(&self) -> Option<&str> {
        match self {
            FactoryName::Default => None,
            FactoryName::Constructor(name) | FactoryName::Function(name) => Some(name),
        }
    }
}

impl fmt::Display for FactoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryName::Default => write!(f, "default"),
            FactoryName::Constructor(name) => write!(f, "constructor `{name}`"),
            FactoryName::Function(name) => write!(f, "function `{name}`"),
        }
    }
}

/// Identifies a loadable module and the factory to call inside it.
///
/// # Examples
///
/// ```
/// use groupscope_core::reference::{FactoryName, LoaderSpec};
///
/// let spec = LoaderSpec::new("builtin")
///     .with_function("flag")
///     .with_param("on");
/// assert_eq!(spec.factory(), &FactoryName::Function("flag".to_string()));
///
/// // Supplying both a constructor and a function is rejected.
/// assert!(LoaderSpec::from_parts("builtin", Some("flag"), Some("Flag")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoaderSpec {
    module: String,
    factory: FactoryName,
    params: Vec<String>,
}

impl LoaderSpec {
    /// Create a spec that loads the module's default factory.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            factory: FactoryName::Default,
            params: Vec::new(),
        }
    }

    /// Build a spec from loosely specified parts.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ConflictingFactory`] when both a function and a
    /// constructor name are supplied, and [`LoadError::EmptyName`] when the
    /// module or the supplied factory name is blank.
    pub fn from_parts(
        module: impl Into<String>,
        function: Option<&str>,
        constructor: Option<&str>,
    ) -> Result<Self, LoadError> {
        let module = module.into();
        if module.trim().is_empty() {
            return Err(LoadError::EmptyName { part: "module" });
        }
        let factory = match (function, constructor) {
            (Some(function), Some(constructor)) => {
                return Err(LoadError::ConflictingFactory {
                    module,
                    function: function.to_string(),
                    constructor: constructor.to_string(),
                });
            }
            (Some(function), None) if function.trim().is_empty() => {
                return Err(LoadError::EmptyName { part: "function" });
            }
            (None, Some(constructor)) if constructor.trim().is_empty() => {
                return Err(LoadError::EmptyName { part: "constructor" });
            }
            (Some(function), None) => FactoryName::Function(function.to_string()),
            (None, Some(constructor)) => FactoryName::Constructor(constructor.to_string()),
            (None, None) => FactoryName::Default,
        };
        Ok(Self {
            module,
            factory,
            params: Vec::new(),
        })
    }

    /// Use a named constructor.
    pub fn with_constructor(mut self, name: impl Into<String>) -> Self {
        self.factory = FactoryName::Constructor(name.into());
        self
    }

    /// Use a named factory function.
    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.factory = FactoryName::Function(name.into());
        self
    }

    /// Append a parameter passed to the factory.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Replace all factory parameters.
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the module name.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the factory to invoke.
    pub fn factory(&self) -> &FactoryName {
        &self.factory
    }

    /// Returns the factory parameters.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    fn validate(&self) -> Result<(), String> {
        if self.module.trim().is_empty() {
            return Err("module name is empty".to_string());
        }
        match self.factory.name() {
            Some(name) if name.trim().is_empty() => {
                Err(format!("{} name is empty", self.factory_kind()))
            }
            _ => Ok(()),
        }
    }

    fn factory_kind(&self) -> &'static str {
        match self.factory {
            FactoryName::Default => "default",
            FactoryName::Constructor(_) => "constructor",
            FactoryName::Function(_) => "function",
        }
    }
}

impl fmt::Display for LoaderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.module, self.factory)
    }
}

/// Serialized form of a [`ModuleReference`], as found in configuration files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleReferenceConfig {
    /// Registry key for the loaded component.
    pub ref_name: String,

    /// Module to load from.
    pub module: String,

    /// Factory function name, exclusive with `constructor`.
    #[serde(default)]
    pub function: Option<String>,

    /// Constructor name, exclusive with `function`.
    #[serde(default)]
    pub constructor: Option<String>,

    /// Parameters handed to the factory.
    #[serde(default)]
    pub params: Vec<String>,
}

impl TryFrom<&ModuleReferenceConfig> for ModuleReference {
    type Error = LoadError;

    fn try_from(config: &ModuleReferenceConfig) -> Result<Self, Self::Error> {
        let spec = LoaderSpec::from_parts(
            config.module.clone(),
            config.function.as_deref(),
            config.constructor.as_deref(),
        )?
        .with_params(config.params.iter().cloned());
        Ok(ModuleReference::new(config.ref_name.clone(), spec))
    }
}

/// A component that has not been loaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    ref_name: String,
    spec: LoaderSpec,
}

impl ModuleReference {
    /// Create a module reference.
    pub fn new(ref_name: impl Into<String>, spec: LoaderSpec) -> Self {
        Self {
            ref_name: ref_name.into(),
            spec,
        }
    }

    /// Returns the registry key.
    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    /// Returns the loader specification.
    pub fn spec(&self) -> &LoaderSpec {
        &self.spec
    }

    /// Check that the reference is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidReference`] when the ref name, the
    /// module name or a factory name is blank.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.ref_name.trim().is_empty() {
            return Err(RegistryError::InvalidReference {
                ref_name: self.ref_name.clone(),
                reason: "reference name is empty".to_string(),
            });
        }
        self.spec
            .validate()
            .map_err(|reason| RegistryError::InvalidReference {
                ref_name: self.ref_name.clone(),
                reason,
            })
    }
}

/// A component that is already materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceReference<C> {
    ref_name: String,
    instance: C,
}

impl<C> InstanceReference<C> {
    /// Create an instance reference.
    pub fn new(ref_name: impl Into<String>, instance: C) -> Self {
        Self {
            ref_name: ref_name.into(),
            instance,
        }
    }

    /// Returns the registry key.
    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    /// Returns the component.
    pub fn instance(&self) -> &C {
        &self.instance
    }

    /// Split into key and component.
    pub fn into_parts(self) -> (String, C) {
        (self.ref_name, self.instance)
    }

    /// Check that the reference is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidReference`] when the ref name is blank.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.ref_name.trim().is_empty() {
            return Err(RegistryError::InvalidReference {
                ref_name: self.ref_name.clone(),
                reason: "reference name is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Either a loadable or an already materialized component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleElementReference<C> {
    /// Load by name during scope resolution.
    Module(ModuleReference),
    /// Register directly.
    Instance(InstanceReference<C>),
}

impl<C> RuleElementReference<C> {
    /// Returns the registry key of either variant.
    pub fn ref_name(&self) -> &str {
        match self {
            RuleElementReference::Module(module) => module.ref_name(),
            RuleElementReference::Instance(instance) => instance.ref_name(),
        }
    }

    /// Returns `true` for a reference that still needs loading.
    pub fn is_module(&self) -> bool {
        matches!(self, RuleElementReference::Module(_))
    }

    /// Check that the reference is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidReference`] for malformed references.
    pub fn validate(&self) -> Result<(), RegistryError> {
        match self {
            RuleElementReference::Module(module) => module.validate(),
            RuleElementReference::Instance(instance) => instance.validate(),
        }
    }
}

impl<C> From<ModuleReference> for RuleElementReference<C> {
    fn from(reference: ModuleReference) -> Self {
        RuleElementReference::Module(reference)
    }
}

impl<C> From<InstanceReference<C>> for RuleElementReference<C> {
    fn from(reference: InstanceReference<C>) -> Self {
        RuleElementReference::Instance(reference)
    }
}
