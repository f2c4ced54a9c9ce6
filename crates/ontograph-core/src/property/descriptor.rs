//! # Property Descriptors
//!
//! A descriptor binds one property kind to one relation field of one class
//! (its domain) and owns the per-instance values of that field.
//!
//! - Values are keyed by the owner's *root* identity, so a role and its taker
//!   share one entry per descriptor
//! - Range and shape come from the field declaration in the class diagram
//! - Attaching the same kind twice to the same domain fails with `DuplicateDomain`
//!
//! The `DescriptorTable` also keeps the per-kind domain -> range map and the
//! sets of all domains and ranges. These accumulate for the lifetime of the
//! knowledge base; `KnowledgeBase::reset` clears only instance values.

use super::PropertyCatalog;
use super::monitored::{MonitoredCollection, MonitoredKind};
use crate::class_diagram::ClassDiagram;
use crate::symbol::{Symbol, WeakSymbol};
use crate::types::{
    ClassId, FieldId, FieldShape, NameId, OntographError, PropertyId, Result, SymbolId,
};
use std::collections::{BTreeMap, BTreeSet};

/// Stored value of one field for one owner.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Single(Option<WeakSymbol>),
    Collection(MonitoredCollection),
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    owner: WeakSymbol,
    slot: Slot,
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// A property kind attached to a field of a domain class.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    id: FieldId,
    property: PropertyId,
    domain: ClassId,
    name: NameId,
    field_name: String,
    range: ClassId,
    shape: FieldShape,
    store: BTreeMap<SymbolId, Binding>,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// The property kind.
    #[must_use]
    pub fn property(&self) -> PropertyId {
        self.property
    }

    /// The class the field is attached to.
    #[must_use]
    pub fn domain(&self) -> ClassId {
        self.domain
    }

    /// Interned field name.
    #[must_use]
    pub fn name(&self) -> NameId {
        self.name
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Declared range (element class for collections).
    #[must_use]
    pub fn range(&self) -> ClassId {
        self.range
    }

    #[must_use]
    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    /// Number of owners with a stored value.
    #[must_use]
    pub fn bound_owners(&self) -> usize {
        self.store.len()
    }

    // =========================================================================
    // VALUE ACCESS
    // =========================================================================

    /// The single value stored for `owner`, if any and still alive.
    #[must_use]
    pub fn single(&self, owner: &Symbol) -> Option<Symbol> {
        match &self.store.get(&owner.root_id())?.slot {
            Slot::Single(value) => value.as_ref()?.upgrade(),
            Slot::Collection(_) => None,
        }
    }

    /// Every live value stored for `owner`, whatever the shape.
    #[must_use]
    pub fn values(&self, owner: &Symbol) -> Vec<Symbol> {
        match self.store.get(&owner.root_id()).map(|b| &b.slot) {
            Some(Slot::Single(value)) => value.iter().filter_map(WeakSymbol::upgrade).collect(),
            Some(Slot::Collection(items)) => items.items(),
            None => Vec::new(),
        }
    }

    /// Whether `value` is stored for `owner` (root identity).
    #[must_use]
    pub fn holds(&self, owner: &Symbol, value: &Symbol) -> bool {
        match self.store.get(&owner.root_id()).map(|b| &b.slot) {
            Some(Slot::Single(Some(current))) => {
                current.root_id() == value.root_id() && current.is_alive()
            }
            Some(Slot::Collection(items)) => items.contains(value),
            _ => false,
        }
    }

    /// The collection stored for `owner`, if the field holds one.
    #[must_use]
    pub fn collection(&self, owner: &Symbol) -> Option<&MonitoredCollection> {
        match &self.store.get(&owner.root_id())?.slot {
            Slot::Collection(items) => Some(items),
            Slot::Single(_) => None,
        }
    }

    pub(crate) fn collection_mut(&mut self, owner: &Symbol) -> Option<&mut MonitoredCollection> {
        match &mut self.store.get_mut(&owner.root_id())?.slot {
            Slot::Collection(items) => Some(items),
            Slot::Single(_) => None,
        }
    }

    /// The collection for `owner`, created empty with `kind` when absent.
    ///
    /// `None` when the owner already holds a single value under this descriptor.
    pub(crate) fn collection_or_insert(
        &mut self,
        owner: &Symbol,
        kind: MonitoredKind,
    ) -> Option<&mut MonitoredCollection> {
        let binding = self.store.entry(owner.root_id()).or_insert_with(|| Binding {
            owner: owner.root().downgrade(),
            slot: Slot::Collection(MonitoredCollection::new(kind)),
        });
        match &mut binding.slot {
            Slot::Collection(items) => Some(items),
            Slot::Single(_) => None,
        }
    }

    /// Bind a fresh, empty collection of `kind` to `owner`, dropping any previous value.
    pub(crate) fn replace_collection(&mut self, owner: &Symbol, kind: MonitoredKind) {
        self.store.insert(
            owner.root_id(),
            Binding {
                owner: owner.root().downgrade(),
                slot: Slot::Collection(MonitoredCollection::new(kind)),
            },
        );
    }

    /// Store a single value. Returns whether the stored value changed.
    pub(crate) fn store_single(&mut self, owner: &Symbol, value: &Symbol) -> bool {
        if self.holds(owner, value) {
            return false;
        }
        self.store.insert(
            owner.root_id(),
            Binding {
                owner: owner.root().downgrade(),
                slot: Slot::Single(Some(value.downgrade())),
            },
        );
        true
    }

    pub(crate) fn clear_store(&mut self) {
        self.store.clear();
    }

    /// Drop entries of dead owners and dead elements. Returns the number of owners dropped.
    pub(crate) fn sweep_store(&mut self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, binding| binding.owner.is_alive());
        for binding in self.store.values_mut() {
            match &mut binding.slot {
                Slot::Collection(items) => {
                    items.purge_dead();
                }
                Slot::Single(value) => {
                    if value.as_ref().is_some_and(|v| !v.is_alive()) {
                        *value = None;
                    }
                }
            }
        }
        before.saturating_sub(self.store.len())
    }
}

// =============================================================================
// DESCRIPTOR TABLE
// =============================================================================

/// All descriptors, indexed by (kind, domain) and by (domain, field name).
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    descriptors: Vec<PropertyDescriptor>,
    by_property_domain: BTreeMap<(PropertyId, ClassId), FieldId>,
    by_domain_name: BTreeMap<(ClassId, NameId), FieldId>,
    domain_range: BTreeMap<PropertyId, BTreeMap<ClassId, ClassId>>,
    all_domains: BTreeMap<PropertyId, BTreeSet<ClassId>>,
    all_ranges: BTreeMap<PropertyId, BTreeSet<ClassId>>,
}

impl DescriptorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `property` to the field `field_name` of `domain`.
    ///
    /// The field must be declared on `domain` or one of its bases.
    pub fn attach(
        &mut self,
        diagram: &ClassDiagram,
        catalog: &PropertyCatalog,
        property: PropertyId,
        domain: ClassId,
        field_name: &str,
    ) -> Result<FieldId> {
        let property_name = catalog.kind(property)?.name().to_string();
        let domain_name = diagram.class(domain)?.name().to_string();

        if self.by_property_domain.contains_key(&(property, domain)) {
            return Err(OntographError::DuplicateDomain {
                property: property_name,
                domain: domain_name,
            });
        }
        let unknown = || OntographError::UnknownField {
            field: field_name.to_string(),
            owner_type: domain_name.clone(),
        };
        let name = diagram.name_id(field_name).ok_or_else(unknown)?;
        let (_, decl) = diagram.field(domain, name).ok_or_else(unknown)?;
        if self.by_domain_name.contains_key(&(domain, name)) {
            return Err(OntographError::DuplicateField {
                field: field_name.to_string(),
                owner_type: domain_name,
            });
        }

        let id = FieldId(self.descriptors.len() as u32);
        self.descriptors.push(PropertyDescriptor {
            id,
            property,
            domain,
            name,
            field_name: field_name.to_string(),
            range: decl.range,
            shape: decl.shape,
            store: BTreeMap::new(),
        });
        self.by_property_domain.insert((property, domain), id);
        self.by_domain_name.insert((domain, name), id);
        self.domain_range
            .entry(property)
            .or_default()
            .insert(domain, decl.range);
        self.all_domains.entry(property).or_default().insert(domain);
        self.all_ranges.entry(property).or_default().insert(decl.range);
        Ok(id)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Get a descriptor by id.
    pub fn get(&self, id: FieldId) -> Result<&PropertyDescriptor> {
        self.descriptors.get(id.0 as usize).ok_or_else(|| unknown_field(id))
    }

    pub(crate) fn get_mut(&mut self, id: FieldId) -> Result<&mut PropertyDescriptor> {
        self.descriptors
            .get_mut(id.0 as usize)
            .ok_or_else(|| unknown_field(id))
    }

    /// All descriptors in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PropertyDescriptor> {
        self.descriptors.iter_mut()
    }

    /// The descriptor of exactly `property` on `class` or the nearest base that has one.
    #[must_use]
    pub fn for_property(
        &self,
        diagram: &ClassDiagram,
        class: ClassId,
        property: PropertyId,
    ) -> Option<FieldId> {
        diagram
            .mro(class)
            .iter()
            .find_map(|c| self.by_property_domain.get(&(property, *c)).copied())
    }

    /// The descriptor of the field named `name` on `class` or the nearest base that has one.
    #[must_use]
    pub fn for_name(&self, diagram: &ClassDiagram, class: ClassId, name: NameId) -> Option<FieldId> {
        diagram
            .mro(class)
            .iter()
            .find_map(|c| self.by_domain_name.get(&(*c, name)).copied())
    }

    /// Domain -> range map of a property kind.
    #[must_use]
    pub fn domain_range(&self, property: PropertyId) -> BTreeMap<ClassId, ClassId> {
        self.domain_range.get(&property).cloned().unwrap_or_default()
    }

    /// Every domain a property kind is attached to.
    #[must_use]
    pub fn all_domains(&self, property: PropertyId) -> BTreeSet<ClassId> {
        self.all_domains.get(&property).cloned().unwrap_or_default()
    }

    /// Every range of a property kind across its domains.
    #[must_use]
    pub fn all_ranges(&self, property: PropertyId) -> BTreeSet<ClassId> {
        self.all_ranges.get(&property).cloned().unwrap_or_default()
    }
}

fn unknown_field(id: FieldId) -> OntographError {
    OntographError::UnknownField {
        field: format!("{id:?}"),
        owner_type: "?".to_string(),
    }
}
