//! Name-keyed store of materialized components.
//!
//! [`RuleElementRegistry`] holds at most one component per ref name.
//! Registering a name that already exists is idempotent: the existing
//! component is kept and returned unless the caller explicitly asks to
//! override it.

use indexmap::IndexMap;
use log::{trace, warn};

use crate::{error::RegistryError, reference::InstanceReference};

/// A name-keyed store of resolved components.
///
/// # Examples
///
/// ```
/// use groupscope_core::{reference::InstanceReference, registry::RuleElementRegistry};
///
/// let mut registry = RuleElementRegistry::new();
/// registry.register(InstanceReference::new("plus", '+'), false);
///
/// // A second registration without override keeps the first component.
/// let kept = *registry.register(InstanceReference::new("plus", 'p'), false);
/// assert_eq!(kept, '+');
/// ```
#[derive(Debug, Clone)]
pub struct RuleElementRegistry<C> {
    entries: IndexMap<String, C>,
}

impl<C> Default for RuleElementRegistry<C> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<C> RuleElementRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component and return the entry now stored under its name.
    ///
    /// When the name is already present and `allow_override` is false the
    /// existing component is returned unchanged. With `allow_override` the
    /// new component replaces it.
    pub fn register(&mut self, reference: InstanceReference<C>, allow_override: bool) -> &C {
        let (ref_name, instance) = reference.into_parts();
        let index = match self.entries.get_index_of(&ref_name) {
            Some(index) if allow_override => {
                trace!(ref_name = ref_name.as_str(); "Overriding registered component");
                self.entries[index] = instance;
                index
            }
            Some(index) => {
                warn!(ref_name = ref_name.as_str(); "Not overriding component with the same name");
                index
            }
            None => self.entries.insert_full(ref_name, instance).0,
        };
        &self.entries[index]
    }

    /// Register a component, failing when the name is already taken.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if a component with the same name
    /// exists. The registry is left unchanged.
    pub fn try_register(&mut self, reference: InstanceReference<C>) -> Result<&C, RegistryError> {
        if self.entries.contains_key(reference.ref_name()) {
            return Err(RegistryError::Duplicate {
                ref_name: reference.ref_name().to_string(),
            });
        }
        Ok(self.register(reference, false))
    }

    /// Remove a component. Returns `true` if it existed.
    pub fn unregister(&mut self, ref_name: &str) -> bool {
        if self.entries.shift_remove(ref_name).is_none() {
            warn!(ref_name; "No component to unregister");
            return false;
        }
        true
    }

    /// Check whether a component is registered under `ref_name`.
    pub fn has(&self, ref_name: &str) -> bool {
        self.entries.contains_key(ref_name)
    }

    /// Get a registered component.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when nothing is registered under
    /// `ref_name`. Use [`has`](Self::has) or [`find`](Self::find) to probe
    /// without an error.
    pub fn get(&self, ref_name: &str) -> Result<&C, RegistryError> {
        self.find(ref_name).ok_or_else(|| RegistryError::NotFound {
            ref_name: ref_name.to_string(),
        })
    }

    /// Get a registered component, if any.
    pub fn find(&self, ref_name: &str) -> Option<&C> {
        self.entries.get(ref_name)
    }

    /// All components in registration order.
    pub fn all_instances(&self) -> Vec<&C> {
        self.entries.values().collect()
    }

    /// All registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = RuleElementRegistry::new();
        let registered = *registry.register(InstanceReference::new("impl", 1), false);

        assert_eq!(registered, 1);
        assert!(registry.has("impl"));
        assert_eq!(registry.get("impl"), Ok(&1));
    }

    #[test]
    fn test_register_without_override_keeps_first() {
        let mut registry = RuleElementRegistry::new();
        registry.register(InstanceReference::new("impl", 1), false);

        assert_eq!(*registry.register(InstanceReference::new("impl", 2), false), 1);
        assert_eq!(*registry.register(InstanceReference::new("impl", 3), false), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_with_override_replaces() {
        let mut registry = RuleElementRegistry::new();
        registry.register(InstanceReference::new("impl", 1), false);

        assert_eq!(*registry.register(InstanceReference::new("impl", 2), true), 2);
        assert_eq!(registry.get("impl"), Ok(&2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_try_register_duplicate() {
        let mut registry = RuleElementRegistry::new();
        registry.register(InstanceReference::new("impl", 1), false);

        let err = registry
            .try_register(InstanceReference::new("impl", 2))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                ref_name: "impl".to_string()
            }
        );
        assert_eq!(registry.get("impl"), Ok(&1));
    }

    #[test]
    fn test_unregister() {
        let mut registry = RuleElementRegistry::new();
        registry.register(InstanceReference::new("1", 1), false);
        registry.register(InstanceReference::new("2", 2), false);
        registry.register(InstanceReference::new("3", 3), false);

        assert!(registry.unregister("2"));
        assert!(!registry.unregister("2"));
        assert_eq!(registry.all_instances(), vec![&1, &3]);
        assert!(registry.has("1"));
        assert!(!registry.has("2"));
        assert!(registry.has("3"));
    }

    #[test]
    fn test_reregister_after_unregister_moves_to_end() {
        let mut registry = RuleElementRegistry::new();
        registry.register(InstanceReference::new("a", 1), false);
        registry.register(InstanceReference::new("b", 2), false);
        registry.unregister("a");
        registry.register(InstanceReference::new("a", 3), false);

        assert_eq!(registry.all_instances(), vec![&2, &3]);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(*registry.register(InstanceReference::new("a", 4), false), 3);
    }

    #[test]
    fn test_override_keeps_position() {
        let mut registry = RuleElementRegistry::new();
        registry.register(InstanceReference::new("a", 1), false);
        registry.register(InstanceReference::new("b", 2), false);
        registry.register(InstanceReference::new("a", 3), true);

        assert_eq!(registry.all_instances(), vec![&3, &2]);
    }

    #[test]
    fn test_get_missing() {
        let registry: RuleElementRegistry<u8> = RuleElementRegistry::new();
        assert!(matches!(
            registry.get("missing"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(registry.find("missing").is_none());
        assert!(registry.is_empty());
    }

    proptest! {
        #[test]
        fn prop_repeated_registration_is_idempotent(name in "[a-z]{1,8}", values in prop::collection::vec(any::<u32>(), 1..10)) {
            let mut registry = RuleElementRegistry::new();
            let first = values[0];
            for value in &values {
                let kept = *registry.register(InstanceReference::new(name.clone(), *value), false);
                prop_assert_eq!(kept, first);
            }
            prop_assert_eq!(registry.len(), 1);
            prop_assert_eq!(registry.names().collect::<Vec<_>>(), vec![name.as_str()]);
        }
    }
}
