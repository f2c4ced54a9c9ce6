//! # Role Overlay
//!
//! Bookkeeping and type algebra for roles.
//!
//! - `RoleRegistry`: which live roles wrap which objects, in both directions
//! - Role-aware type algebra on `ClassDiagram`: a role class counts as one
//!   inheritance step away from its taker class
//!
//! The registry holds weak references only. Entries for dropped roles are
//! removed by `prune()`, which `KnowledgeBase::sweep` calls unless disabled in
//! the configuration.

use crate::class_diagram::ClassDiagram;
use crate::symbol::{Symbol, WeakSymbol};
use crate::types::{ClassId, SymbolId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// ROLE REGISTRY
// =============================================================================

/// Bidirectional map between role-takers and the roles wrapping them.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    /// taker id -> every role whose taker chain contains the taker
    roles_by_taker: BTreeMap<SymbolId, Vec<WeakSymbol>>,
    /// role id -> its taker chain, nearest first
    takers_by_role: BTreeMap<SymbolId, Vec<WeakSymbol>>,
}

impl RoleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly created role under every object in its taker chain.
    pub fn register(&mut self, role: &Symbol) {
        let chain = role.role_taker_chain();
        if chain.is_empty() {
            return;
        }
        for taker in &chain {
            let roles = self.roles_by_taker.entry(taker.id()).or_default();
            if !roles.iter().any(|r| r.id() == role.id()) {
                roles.push(role.downgrade());
            }
        }
        self.takers_by_role
            .insert(role.id(), chain.iter().map(Symbol::downgrade).collect());
    }

    /// Live roles wrapping `symbol`, directly or through other roles, in creation order.
    #[must_use]
    pub fn roles_of(&self, symbol: &Symbol) -> Vec<Symbol> {
        self.roles_by_taker
            .get(&symbol.id())
            .map(|roles| roles.iter().filter_map(WeakSymbol::upgrade).collect())
            .unwrap_or_default()
    }

    /// Live objects in the taker chain of `role`, nearest first.
    #[must_use]
    pub fn takers_of(&self, role: &Symbol) -> Vec<Symbol> {
        self.takers_by_role
            .get(&role.id())
            .map(|takers| takers.iter().filter_map(WeakSymbol::upgrade).collect())
            .unwrap_or_default()
    }

    /// Number of registered roles (live or not yet pruned).
    #[must_use]
    pub fn len(&self) -> usize {
        self.takers_by_role.len()
    }

    /// Whether no role is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.takers_by_role.is_empty()
    }

    /// Drop entries for roles that no longer exist. Returns the number of roles dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.takers_by_role.len();
        for roles in self.roles_by_taker.values_mut() {
            roles.retain(WeakSymbol::is_alive);
        }
        self.roles_by_taker.retain(|_, roles| !roles.is_empty());
        let live: BTreeSet<SymbolId> = self
            .roles_by_taker
            .values()
            .flatten()
            .map(WeakSymbol::id)
            .collect();
        self.takers_by_role.retain(|id, _| live.contains(id));
        before.saturating_sub(self.takers_by_role.len())
    }

    /// Forget every role.
    pub fn clear(&mut self) {
        self.roles_by_taker.clear();
        self.takers_by_role.clear();
    }
}

// =============================================================================
// ROLE-AWARE TYPE ALGEBRA
// =============================================================================

impl ClassDiagram {
    /// True if `child` is a subclass of `parent`, or a role class whose taker
    /// type satisfies the same test, recursively.
    #[must_use]
    pub fn issubclass_or_role(&self, child: ClassId, parent: ClassId) -> bool {
        if self.is_subclass(child, parent) {
            return true;
        }
        self.role_taker_type(child)
            .is_some_and(|taker| taker != child && self.issubclass_or_role(taker, parent))
    }

    /// Minimum number of inheritance steps from `child` to `parent`.
    ///
    /// A class declared as a role has one extra step to its taker class in
    /// addition to its bases. `None` when `parent` is unreachable.
    #[must_use]
    pub fn role_aware_inheritance_path_length(
        &self,
        child: ClassId,
        parent: ClassId,
    ) -> Option<usize> {
        if !self.issubclass_or_role(child, parent) {
            return None;
        }
        if child == parent {
            return Some(0);
        }
        let info = self.class(child).ok()?;
        info.bases()
            .iter()
            .copied()
            .chain(info.direct_role_taker())
            .filter(|step| self.issubclass_or_role(*step, parent))
            .filter_map(|step| self.role_aware_inheritance_path_length(step, parent))
            .min()
            .map(|len| len.saturating_add(1))
    }

    /// MRO with the taker's role-aware MRO spliced in right after each class
    /// that directly declares a role-taker.
    #[must_use]
    pub fn role_aware_mro(&self, class: ClassId) -> Vec<ClassId> {
        let mut out: Vec<ClassId> = Vec::new();
        for step in self.mro(class) {
            if !out.contains(step) {
                out.push(*step);
            }
            let taker = self.class(*step).ok().and_then(|c| c.direct_role_taker());
            if let Some(taker) = taker {
                for inherited in self.role_aware_mro(taker) {
                    if !out.contains(&inherited) {
                        out.push(inherited);
                    }
                }
            }
        }
        // the root always closes the order
        let root = self.root();
        if let Some(pos) = out.iter().position(|c| *c == root) {
            out.remove(pos);
            out.push(root);
        }
        out
    }

    /// First class in the role-aware MRO of `classes[0]` shared by every other class.
    #[must_use]
    pub fn role_aware_nearest_common_ancestor(&self, classes: &[ClassId]) -> Option<ClassId> {
        let (first, rest) = classes.split_first()?;
        let others: Vec<Vec<ClassId>> = rest.iter().map(|c| self.role_aware_mro(*c)).collect();
        self.role_aware_mro(*first)
            .into_iter()
            .find(|candidate| others.iter().all(|mro| mro.contains(candidate)))
    }

    /// Sort classes by their distance from their nearest common ancestor,
    /// closest first. Ties put plain classes before roles, and roles with
    /// fewer taker hops first.
    #[must_use]
    pub fn sort_by_role_aware_path_length(&self, classes: &[ClassId]) -> Vec<ClassId> {
        let Some(ancestor) = self.role_aware_nearest_common_ancestor(classes) else {
            return classes.to_vec();
        };
        let mut keyed: Vec<(ClassId, (usize, bool, usize))> = classes
            .iter()
            .map(|c| (*c, self.specificity_key(*c, ancestor)))
            .collect();
        keyed.sort_by_key(|(_, key)| *key);
        keyed.into_iter().map(|(c, _)| c).collect()
    }

    /// The preferred class among several applicable candidates: the one
    /// farthest from their common ancestor, ties broken as in
    /// `sort_by_role_aware_path_length`.
    #[must_use]
    pub fn most_specific_type(&self, candidates: &[ClassId]) -> Option<ClassId> {
        let ancestor = self.role_aware_nearest_common_ancestor(candidates)?;
        let deepest = candidates
            .iter()
            .map(|c| self.specificity_key(*c, ancestor).0)
            .max()?;
        self.sort_by_role_aware_path_length(candidates)
            .into_iter()
            .find(|c| self.specificity_key(*c, ancestor).0 == deepest)
    }

    fn specificity_key(&self, class: ClassId, ancestor: ClassId) -> (usize, bool, usize) {
        (
            self.role_aware_inheritance_path_length(class, ancestor)
                .unwrap_or(usize::MAX),
            self.is_role_class(class),
            self.all_role_taker_types(class).len(),
        )
    }
}
