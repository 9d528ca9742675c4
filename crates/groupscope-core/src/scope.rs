//! Hierarchical scopes of component registries.
//!
//! A [`ScopeTree`] is an arena of scopes. Each scope owns one
//! [`RuleElementRegistry`] per named slot, a parent link, an ordered list of
//! children and a queue of pending module loads. Handles are plain
//! [`ScopeId`] indices, so parent and child links never own each other.
//!
//! Lookups fall back to ancestors, giving "nearest enclosing definition
//! wins" semantics. Module references are never loaded at add time; they are
//! queued and materialized by [`ScopeTree::resolve`], which visits children
//! before their parent and later siblings before earlier ones.
//!
//! All methods taking a [`ScopeId`] panic if the id was not produced by the
//! same tree.

use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
};

use log::{debug, error, info, trace};

use crate::{
    error::{LoadError, LoadFailure, ResolveError, ScopeError},
    loader::Loader,
    reference::{InstanceReference, ModuleReference, RuleElementReference},
    registry::RuleElementRegistry,
};

/// Lightweight handle to a scope inside a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    /// Position of the scope in its tree's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an added reference interacts with ancestor and descendant scopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Promote the registration to the furthest ancestor already holding the
    /// name, removing it from every other ancestor and from this scope.
    pub override_ancestors: bool,
    /// Purge the name from every descendant scope after adding.
    pub override_descendants: bool,
}

impl AddOptions {
    /// Plain local registration, keeping any existing entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set [`override_ancestors`](Self::override_ancestors).
    pub fn with_override(mut self, value: bool) -> Self {
        self.override_ancestors = value;
        self
    }

    /// Set [`override_descendants`](Self::override_descendants).
    pub fn with_override_down(mut self, value: bool) -> Self {
        self.override_descendants = value;
        self
    }
}

/// Shape check run against a freshly loaded component.
pub type Check<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Callback invoked after a pending load has been registered.
pub type OnResolved<C> = Box<dyn FnOnce(&str, &C) + Send>;

/// A module reference waiting for [`ScopeTree::resolve`].
pub struct PendingResolution<C> {
    reference: ModuleReference,
    slot: String,
    options: AddOptions,
    check: Option<Check<C>>,
    on_resolved: Option<OnResolved<C>>,
}

impl<C> PendingResolution<C> {
    /// Queue `reference` for registration into `slot`.
    pub fn new(reference: ModuleReference, slot: impl Into<String>) -> Self {
        Self {
            reference,
            slot: slot.into(),
            options: AddOptions::default(),
            check: None,
            on_resolved: None,
        }
    }

    /// Register with the given override options once loaded.
    pub fn with_options(mut self, options: AddOptions) -> Self {
        self.options = options;
        self
    }

    /// Reject loaded components for which `check` returns `false`.
    pub fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    /// Run `callback` with the registered component after resolution.
    pub fn on_resolved<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&str, &C) + Send + 'static,
    {
        self.on_resolved = Some(Box::new(callback));
        self
    }

    pub fn reference(&self) -> &ModuleReference {
        &self.reference
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn options(&self) -> AddOptions {
        self.options
    }
}

impl<C> fmt::Debug for PendingResolution<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResolution")
            .field("reference", &self.reference)
            .field("slot", &self.slot)
            .field("options", &self.options)
            .field("check", &self.check.is_some())
            .field("on_resolved", &self.on_resolved.is_some())
            .finish()
    }
}

/// Summary of a successful [`ScopeTree::resolve`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Every scope of the subtree, in the order it was processed.
    pub visited: Vec<ScopeId>,
    /// Number of pending loads registered.
    pub registered: usize,
}

#[derive(Debug)]
struct ScopeNode<C> {
    kind: String,
    name: String,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    slots: HashMap<String, RuleElementRegistry<C>>,
    pending: Vec<PendingResolution<C>>,
}

/// Arena owning every scope of a hierarchy.
///
/// # Examples
///
/// ```
/// use groupscope_core::{reference::InstanceReference, scope::{AddOptions, ScopeTree}};
///
/// let mut tree = ScopeTree::with_slots(["operators"]);
/// let root = tree.create_scope(None, "Root");
/// let child = tree.create_scope(Some(root), "Document");
///
/// tree.add_item(root, InstanceReference::new("plus", '+').into(), "operators", AddOptions::new())
///     .unwrap();
///
/// // Lookups fall through to the parent.
/// assert_eq!(tree.lookup(child, "plus", "operators", true), Some(&'+'));
/// assert_eq!(tree.lookup(child, "plus", "operators", false), None);
/// ```
#[derive(Debug)]
pub struct ScopeTree<C> {
    nodes: Vec<ScopeNode<C>>,
    default_slots: Vec<String>,
}

impl<C> Default for ScopeTree<C> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            default_slots: Vec::new(),
        }
    }
}

impl<C> ScopeTree<C> {
    /// Create an empty tree whose scopes start without slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree where every new scope starts with `slots`.
    pub fn with_slots<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: Vec::new(),
            default_slots: slots.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a scope, attached as the last child of `parent` if given.
    pub fn create_scope(&mut self, parent: Option<ScopeId>, kind: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        let kind = kind.into();
        let name = format!("{kind}-{}", id.0);
        let slots = self
            .default_slots
            .iter()
            .map(|slot| (slot.clone(), RuleElementRegistry::new()))
            .collect();

        self.nodes.push(ScopeNode {
            kind,
            name,
            parent,
            children: Vec::new(),
            slots,
            pending: Vec::new(),
        });
        if let Some(parent) = parent {
            self.node_mut(parent).children.push(id);
        }
        trace!(scope = self.node(id).name.as_str(); "Created scope");
        id
    }

    /// Number of scopes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no scope was created yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Generated scope name, `<kind>-<index>`.
    pub fn name(&self, id: ScopeId) -> &str {
        &self.node(id).name
    }

    pub fn kind(&self, id: ScopeId) -> &str {
        &self.node(id).kind
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.node(id).parent
    }

    /// Children in attachment order.
    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        &self.node(id).children
    }

    /// Add an empty slot. Returns `false` if it already existed.
    pub fn add_slot(&mut self, id: ScopeId, slot: impl Into<String>) -> bool {
        let slot = slot.into();
        let slots = &mut self.node_mut(id).slots;
        if slots.contains_key(&slot) {
            return false;
        }
        slots.insert(slot, RuleElementRegistry::new());
        true
    }

    pub fn has_slot(&self, id: ScopeId, slot: &str) -> bool {
        self.node(id).slots.contains_key(slot)
    }

    /// Remove a slot and its registry.
    ///
    /// Pending loads still bound to the slot fail at resolve time with
    /// [`ResolveError::UnresolvedReference`].
    pub fn remove_slot(&mut self, id: ScopeId, slot: &str) -> Option<RuleElementRegistry<C>> {
        self.node_mut(id).slots.remove(slot)
    }

    pub fn slot(&self, id: ScopeId, slot: &str) -> Option<&RuleElementRegistry<C>> {
        self.node(id).slots.get(slot)
    }

    pub fn slot_mut(&mut self, id: ScopeId, slot: &str) -> Option<&mut RuleElementRegistry<C>> {
        self.node_mut(id).slots.get_mut(slot)
    }

    /// Slot names of a scope, sorted.
    pub fn slot_names(&self, id: ScopeId) -> Vec<&str> {
        let mut names: Vec<&str> = self.node(id).slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Add a reference to `slot` of scope `id`.
    ///
    /// Instances are registered immediately. Module references are queued
    /// and registered, with the same options, by [`resolve`](Self::resolve).
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownSlot`] if the scope has no such slot and
    /// [`ScopeError::Registry`] for a malformed reference.
    pub fn add_item(
        &mut self,
        id: ScopeId,
        reference: RuleElementReference<C>,
        slot: &str,
        options: AddOptions,
    ) -> Result<(), ScopeError> {
        reference.validate()?;
        self.require_slot(id, slot)?;

        match reference {
            RuleElementReference::Module(module) => {
                debug!(
                    scope = self.node(id).name.as_str(),
                    ref_name = module.ref_name(),
                    slot;
                    "Queued module reference"
                );
                let pending = PendingResolution::new(module, slot).with_options(options);
                self.node_mut(id).pending.push(pending);
            }
            RuleElementReference::Instance(instance) => {
                self.register_instance(id, instance, slot, options);
            }
        }
        Ok(())
    }

    /// Add several references in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// See [`add_item`](Self::add_item). References before the failing one
    /// stay added.
    pub fn add_items<I>(
        &mut self,
        id: ScopeId,
        references: I,
        slot: &str,
        options: AddOptions,
    ) -> Result<(), ScopeError>
    where
        I: IntoIterator<Item = RuleElementReference<C>>,
    {
        for reference in references {
            self.add_item(id, reference, slot, options)?;
        }
        Ok(())
    }

    /// Queue a fully configured pending load.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownSlot`] if the target slot is missing and
    /// [`ScopeError::Registry`] for a malformed reference.
    pub fn enqueue(&mut self, id: ScopeId, pending: PendingResolution<C>) -> Result<(), ScopeError> {
        pending.reference.validate()?;
        self.require_slot(id, &pending.slot)?;
        self.node_mut(id).pending.push(pending);
        Ok(())
    }

    /// Pending loads of one scope, in queue order.
    pub fn pending(&self, id: ScopeId) -> &[PendingResolution<C>] {
        &self.node(id).pending
    }

    /// Returns `true` if `id` or any descendant has pending loads.
    pub fn has_pending_in_subtree(&self, id: ScopeId) -> bool {
        !self.node(id).pending.is_empty()
            || self
                .node(id)
                .children
                .iter()
                .any(|child| self.has_pending_in_subtree(*child))
    }

    /// Remove names from `slot` of this scope, of every ancestor when
    /// `override_ancestors` and of every descendant when
    /// `override_descendants`. Scopes lacking the slot are skipped.
    ///
    /// Returns the number of entries removed.
    pub fn remove_items(
        &mut self,
        id: ScopeId,
        names: &[&str],
        slot: &str,
        override_ancestors: bool,
        override_descendants: bool,
    ) -> usize {
        let mut removed = self.remove_in_scope(id, names, slot);
        if override_ancestors {
            let mut current = self.node(id).parent;
            while let Some(ancestor) = current {
                removed += self.remove_in_scope(ancestor, names, slot);
                current = self.node(ancestor).parent;
            }
        }
        if override_descendants {
            removed += self.remove_in_descendants(id, names, slot);
        }
        removed
    }

    /// Find a component, searching ancestors when `search_parent` is set.
    pub fn lookup(&self, id: ScopeId, name: &str, slot: &str, search_parent: bool) -> Option<&C> {
        let node = self.node(id);
        if let Some(found) = node.slots.get(slot).and_then(|registry| registry.find(name)) {
            return Some(found);
        }
        match node.parent {
            Some(parent) if search_parent => self.lookup(parent, name, slot, true),
            _ => None,
        }
    }

    /// Returns `true` if `name` is visible from `id`, ancestors included.
    pub fn has_item(&self, id: ScopeId, name: &str, slot: &str) -> bool {
        self.lookup(id, name, slot, true).is_some()
    }

    /// Number of ancestors. The root has depth 0.
    pub fn depth(&self, id: ScopeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Ancestor `height` levels up. Height 0 is the scope itself.
    pub fn parent_at_height(&self, id: ScopeId, height: usize) -> Option<ScopeId> {
        let mut current = Some(id);
        for _ in 0..height {
            current = self.node(current?).parent;
        }
        current
    }

    /// Topmost ancestor of `id`, or `id` itself for a root.
    pub fn root_of(&self, id: ScopeId) -> ScopeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: ScopeId, id: ScopeId) -> bool {
        let mut current = Some(id);
        while let Some(scope) = current {
            if scope == ancestor {
                return true;
            }
            current = self.node(scope).parent;
        }
        false
    }

    /// Move `id` to the end of `new_parent`'s children.
    ///
    /// The old parent loses the child in the same call. Nothing is modified
    /// when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::WouldCycle`] when `new_parent` is `id` or one of
    /// its descendants, and [`ScopeError::ScopeInconsistency`] when the old
    /// parent does not list `id` as a child.
    pub fn re_parent(&mut self, id: ScopeId, new_parent: ScopeId) -> Result<(), ScopeError> {
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(ScopeError::WouldCycle {
                scope: self.node(id).name.clone(),
                parent: self.node(new_parent).name.clone(),
            });
        }

        if let Some(old_parent) = self.node(id).parent {
            let Some(index) = self.node(old_parent).children.iter().position(|c| *c == id) else {
                let err = ScopeError::ScopeInconsistency(format!(
                    "child scope `{}` not found in parent scope `{}` when re-parenting",
                    self.node(id).name,
                    self.node(old_parent).name
                ));
                error!(err:%; "Scope tree is corrupt");
                return Err(err);
            };
            self.node_mut(old_parent).children.remove(index);
        }

        self.node_mut(id).parent = Some(new_parent);
        self.node_mut(new_parent).children.push(id);
        debug!(
            scope = self.node(id).name.as_str(),
            parent = self.node(new_parent).name.as_str();
            "Re-parented scope"
        );
        Ok(())
    }

    /// Attach `new_root` above the current root of `id`'s hierarchy.
    ///
    /// # Errors
    ///
    /// See [`re_parent`](Self::re_parent).
    pub fn set_root_parent(&mut self, id: ScopeId, new_root: ScopeId) -> Result<(), ScopeError> {
        let root = self.root_of(id);
        self.re_parent(root, new_root)
    }

    /// Loose structural equality: same kind and same slot names.
    ///
    /// Registry contents are not compared.
    pub fn is_same_scope(&self, a: ScopeId, b: ScopeId) -> bool {
        if a == b {
            return true;
        }
        let (left, right) = (self.node(a), self.node(b));
        left.kind == right.kind
            && left.slots.len() == right.slots.len()
            && left.slots.keys().all(|slot| right.slots.contains_key(slot))
    }

    fn node(&self, id: ScopeId) -> &ScopeNode<C> {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode<C> {
        &mut self.nodes[id.0]
    }

    fn require_slot(&self, id: ScopeId, slot: &str) -> Result<(), ScopeError> {
        if self.has_slot(id, slot) {
            Ok(())
        } else {
            Err(ScopeError::UnknownSlot {
                scope: self.node(id).name.clone(),
                slot: slot.to_string(),
            })
        }
    }

    /// Register an instance applying the override rules. The slot must exist.
    fn register_instance(
        &mut self,
        id: ScopeId,
        instance: InstanceReference<C>,
        slot: &str,
        options: AddOptions,
    ) {
        let name = instance.ref_name().to_string();

        if options.override_ancestors {
            match self.unregister_from_ancestors(id, &name, slot) {
                Some(furthest) => {
                    debug!(
                        ref_name = name.as_str(),
                        scope = self.node(furthest).name.as_str();
                        "Promoting registration to furthest ancestor"
                    );
                    if let Some(registry) = self.slot_mut(furthest, slot) {
                        registry.register(instance, true);
                    }
                    if let Some(registry) = self.slot_mut(id, slot) {
                        if registry.has(&name) {
                            registry.unregister(&name);
                        }
                    }
                }
                None => {
                    if let Some(registry) = self.slot_mut(id, slot) {
                        registry.register(instance, true);
                    }
                }
            }
        } else if let Some(registry) = self.slot_mut(id, slot) {
            registry.register(instance, false);
        }

        if options.override_descendants {
            self.remove_in_descendants(id, &[name.as_str()], slot);
        }
    }

    /// Remove `name` from every ancestor holding it, returning the one
    /// closest to the root.
    fn unregister_from_ancestors(&mut self, id: ScopeId, name: &str, slot: &str) -> Option<ScopeId> {
        let mut furthest = None;
        let mut current = self.node(id).parent;
        while let Some(ancestor) = current {
            if let Some(registry) = self.slot_mut(ancestor, slot) {
                if registry.has(name) {
                    registry.unregister(name);
                    furthest = Some(ancestor);
                }
            }
            current = self.node(ancestor).parent;
        }
        furthest
    }

    fn remove_in_scope(&mut self, id: ScopeId, names: &[&str], slot: &str) -> usize {
        let Some(registry) = self.slot_mut(id, slot) else {
            return 0;
        };
        names
            .iter()
            .filter(|name| registry.has(name) && registry.unregister(name))
            .count()
    }

    fn remove_in_descendants(&mut self, id: ScopeId, names: &[&str], slot: &str) -> usize {
        let children = self.node(id).children.clone();
        children
            .into_iter()
            .map(|child| {
                self.remove_in_scope(child, names, slot) + self.remove_in_descendants(child, names, slot)
            })
            .sum()
    }

    /// Children before parent, later siblings before earlier ones.
    fn resolution_order(&self, id: ScopeId, order: &mut Vec<ScopeId>) {
        for child in self.node(id).children.iter().rev() {
            self.resolution_order(*child, order);
        }
        order.push(id);
    }
}

impl<C> ScopeTree<C>
where
    C: Send + Sync,
{
    /// Materialize every pending load in the subtree rooted at `id`.
    ///
    /// Scopes are processed one at a time: children before their parent and
    /// later-attached siblings first. Within a scope every pending load runs
    /// in queue order; the results are registered only if all of them
    /// succeed, after which the queue is cleared and callbacks run.
    ///
    /// # Errors
    ///
    /// Stops at the first scope with a failed load and returns
    /// [`ResolveError::LoaderFailure`] listing every failed reference of that
    /// scope. That scope and every scope after it keep their queues, so the
    /// call can be retried. Scopes processed earlier stay resolved.
    /// A load bound to a slot that was removed meanwhile yields
    /// [`ResolveError::UnresolvedReference`].
    pub async fn resolve<L>(&mut self, id: ScopeId, loader: &L) -> Result<ResolveReport, ResolveError>
    where
        L: Loader<C> + ?Sized,
    {
        let mut order = Vec::new();
        self.resolution_order(id, &mut order);

        let mut report = ResolveReport::default();
        for scope in order {
            report.registered += self.resolve_scope(scope, loader).await?;
            report.visited.push(scope);
        }

        info!(
            scopes = report.visited.len(),
            registered = report.registered;
            "Scope resolution completed"
        );
        Ok(report)
    }

    async fn resolve_scope<L>(&mut self, id: ScopeId, loader: &L) -> Result<usize, ResolveError>
    where
        L: Loader<C> + ?Sized,
    {
        if self.node(id).pending.is_empty() {
            return Ok(0);
        }
        debug!(
            scope = self.node(id).name.as_str(),
            pending = self.node(id).pending.len();
            "Resolving scope"
        );

        if let Some(pending) = self
            .node(id)
            .pending
            .iter()
            .find(|pending| !self.has_slot(id, &pending.slot))
        {
            return Err(ResolveError::UnresolvedReference {
                scope: id,
                scope_name: self.node(id).name.clone(),
                ref_name: pending.reference.ref_name().to_string(),
                slot: pending.slot.clone(),
            });
        }

        let jobs: Vec<_> = self
            .node(id)
            .pending
            .iter()
            .map(|pending| (pending.reference.clone(), pending.check.clone()))
            .collect();

        let mut loaded = Vec::with_capacity(jobs.len());
        let mut failures = Vec::new();
        for (reference, check) in jobs {
            let ref_name = reference.ref_name().to_string();
            match loader.load(reference.spec()).await {
                Ok(component) => {
                    if check.as_ref().is_some_and(|check| !check(&component)) {
                        failures.push(LoadFailure {
                            error: LoadError::Validation {
                                ref_name: ref_name.clone(),
                            },
                            ref_name,
                        });
                    } else {
                        loaded.push(component);
                    }
                }
                Err(error) => failures.push(LoadFailure { ref_name, error }),
            }
        }

        if !failures.is_empty() {
            let err = ResolveError::LoaderFailure {
                scope: id,
                scope_name: self.node(id).name.clone(),
                failures,
            };
            error!(err:%; "Scope resolution failed");
            return Err(err);
        }

        let pending = std::mem::take(&mut self.node_mut(id).pending);
        let registered = pending.len();
        for (entry, component) in pending.into_iter().zip(loaded) {
            let PendingResolution {
                reference,
                slot,
                options,
                on_resolved,
                ..
            } = entry;
            let name = reference.ref_name().to_string();
            trace!(ref_name = name.as_str(), slot = slot.as_str(); "Registering loaded component");
            self.register_instance(id, InstanceReference::new(name.clone(), component), &slot, options);

            if let Some(callback) = on_resolved {
                if let Some(component) = self.lookup(id, &name, &slot, true) {
                    callback(&name, component);
                }
            }
        }
        Ok(registered)
    }
}
