//! # Monitored Collections
//!
//! Collection values of relation fields.
//!
//! A monitored collection never performs inference itself; the knowledge
//! base routes every insertion through the owning descriptor so that each
//! element insertion (not whole-value replacement) is the unit of inference.
//! Elements are held as weak handles and compared by root identity, so a role
//! and its taker count as the same element.

use crate::symbol::{Symbol, WeakSymbol};
use crate::types::ContainerKind;
use std::collections::BTreeMap;

/// The two monitored collection flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MonitoredKind {
    /// Unordered semantics, insertion-ordered iteration, no positional access.
    Set,
    /// Ordered, positional insert/replace supported.
    List,
}

/// A collection value bound to one owner and one descriptor.
#[derive(Debug, Clone)]
pub struct MonitoredCollection {
    kind: MonitoredKind,
    items: Vec<WeakSymbol>,
}

impl MonitoredCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(kind: MonitoredKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> MonitoredKind {
        self.kind
    }

    /// Whether a live element with the same root identity is present.
    #[must_use]
    pub fn contains(&self, value: &Symbol) -> bool {
        self.items
            .iter()
            .any(|item| item.root_id() == value.root_id() && item.is_alive())
    }

    /// Number of stored elements, dead ones included until purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Live elements in order.
    #[must_use]
    pub fn items(&self) -> Vec<Symbol> {
        self.items.iter().filter_map(WeakSymbol::upgrade).collect()
    }

    /// Append unless already present. Returns whether the element was added.
    pub fn push(&mut self, value: &Symbol) -> bool {
        if self.contains(value) {
            return false;
        }
        self.items.push(value.downgrade());
        true
    }

    /// Insert at `index` (clamped to the length) unless already present.
    pub fn insert_at(&mut self, index: usize, value: &Symbol) -> bool {
        if self.contains(value) {
            return false;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, value.downgrade());
        true
    }

    /// Replace the element at `index`. Returns the previous element, `None` when out of bounds.
    pub fn replace_at(&mut self, index: usize, value: &Symbol) -> Option<WeakSymbol> {
        let slot = self.items.get_mut(index)?;
        Some(std::mem::replace(slot, value.downgrade()))
    }

    /// Remove the element with the same root identity. Returns whether one was removed.
    pub fn remove(&mut self, value: &Symbol) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.root_id() != value.root_id());
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop elements whose object is gone. Returns how many were dropped.
    pub fn purge_dead(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(WeakSymbol::is_alive);
        before.saturating_sub(self.items.len())
    }
}

// =============================================================================
// CONTAINER REGISTRY
// =============================================================================

/// Maps runtime container kinds to the monitored flavor that wraps them.
///
/// Sets and lists are registered by default. Assigning any other kind fails
/// with `UnsupportedContainer` unless a mapping is registered first.
#[derive(Debug, Clone)]
pub struct ContainerRegistry {
    map: BTreeMap<ContainerKind, MonitoredKind>,
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(ContainerKind::Set, MonitoredKind::Set);
        map.insert(ContainerKind::List, MonitoredKind::List);
        Self { map }
    }
}

impl ContainerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or override) the monitored flavor for a container kind.
    pub fn register(&mut self, kind: ContainerKind, monitored: MonitoredKind) {
        self.map.insert(kind, monitored);
    }

    /// The monitored flavor for a container kind, if one is registered.
    #[must_use]
    pub fn monitored_for(&self, kind: ContainerKind) -> Option<MonitoredKind> {
        self.map.get(&kind).copied()
    }
}
