//! Loading components by logical name.
//!
//! Scope resolution never constructs components itself. It hands each pending
//! [`LoaderSpec`] to a [`Loader`], which is free to do I/O. [`FactoryLoader`]
//! is the in-process implementation: a table of factories registered
//! explicitly at start up and looked up by module and factory name.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use log::{debug, error};

use crate::{
    error::LoadError,
    reference::{FactoryName, LoaderSpec},
};

/// Something that can turn a [`LoaderSpec`] into a live component.
#[async_trait]
pub trait Loader<C>: Send + Sync {
    /// Load the component described by `spec`.
    async fn load(&self, spec: &LoaderSpec) -> Result<C, LoadError>;
}

/// A factory registered in a [`FactoryLoader`]. Receives the [`LoaderSpec`] params.
pub type Factory<C> = Arc<dyn Fn(&[String]) -> Result<C, String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FactoryKey {
    module: String,
    factory: FactoryName,
}

/// A static name-to-factory table.
///
/// # Examples
///
/// ```
/// use groupscope_core::{loader::{FactoryLoader, Loader}, reference::LoaderSpec};
///
/// let loader = FactoryLoader::new()
///     .with_function("builtin", "answer", |_params: &[String]| Ok(42));
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let value = runtime
///     .block_on(loader.load(&LoaderSpec::new("builtin").with_function("answer")))
///     .unwrap();
/// assert_eq!(value, 42);
/// ```
pub struct FactoryLoader<C> {
    factories: HashMap<FactoryKey, Factory<C>>,
}

impl<C> Default for FactoryLoader<C> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for FactoryLoader<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .factories
            .keys()
            .map(|key| format!("{} ({})", key.module, key.factory))
            .collect();
        keys.sort();
        f.debug_struct("FactoryLoader")
            .field("factories", &keys)
            .finish()
    }
}

impl<C> FactoryLoader<C> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default factory of `module`.
    pub fn with_default<F>(self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&[String]) -> Result<C, String> + Send + Sync + 'static,
    {
        self.with_factory(module, FactoryName::Default, factory)
    }

    /// Register a named constructor of `module`.
    pub fn with_constructor<F>(
        self,
        module: impl Into<String>,
        name: impl Into<String>,
        factory: F,
    ) -> Self
    where
        F: Fn(&[String]) -> Result<C, String> + Send + Sync + 'static,
    {
        self.with_factory(module, FactoryName::Constructor(name.into()), factory)
    }

    /// Register a named factory function of `module`.
    pub fn with_function<F>(
        self,
        module: impl Into<String>,
        name: impl Into<String>,
        factory: F,
    ) -> Self
    where
        F: Fn(&[String]) -> Result<C, String> + Send + Sync + 'static,
    {
        self.with_factory(module, FactoryName::Function(name.into()), factory)
    }

    fn with_factory<F>(mut self, module: impl Into<String>, factory: FactoryName, f: F) -> Self
    where
        F: Fn(&[String]) -> Result<C, String> + Send + Sync + 'static,
    {
        let key = FactoryKey {
            module: module.into(),
            factory,
        };
        self.factories.insert(key, Arc::new(f));
        self
    }

    /// Returns `true` if `module` has at least one registered factory.
    pub fn has_module(&self, module: &str) -> bool {
        self.factories.keys().any(|key| key.module == module)
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no factory is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn instantiate(&self, spec: &LoaderSpec) -> Result<C, LoadError> {
        let key = FactoryKey {
            module: spec.module().to_string(),
            factory: spec.factory().clone(),
        };
        let Some(factory) = self.factories.get(&key) else {
            if self.has_module(spec.module()) {
                return Err(LoadError::UnknownFactory {
                    module: spec.module().to_string(),
                    factory: spec.factory().to_string(),
                });
            }
            return Err(LoadError::UnknownModule(spec.module().to_string()));
        };

        factory(spec.params()).map_err(|message| LoadError::Factory {
            module: spec.module().to_string(),
            message,
        })
    }
}

#[async_trait]
impl<C: Send + Sync> Loader<C> for FactoryLoader<C> {
    async fn load(&self, spec: &LoaderSpec) -> Result<C, LoadError> {
        debug!(spec:% = spec; "Loading component");
        self.instantiate(spec).inspect_err(|err| {
            error!(spec:% = spec, err:% = err; "Component load failed");
        })
    }
}
