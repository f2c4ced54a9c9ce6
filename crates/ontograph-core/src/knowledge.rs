//! # Knowledge Base
//!
//! The handle applications write through and read from.
//!
//! A `KnowledgeBase` owns every registry of the system:
//! - the class diagram and property catalog (declarations)
//! - the descriptor table (field bindings and per-instance values)
//! - the container registry (runtime container -> monitored collection)
//! - the role registry
//! - the symbol graph (nodes, relations, inference queue)
//!
//! All writes go through `set`, `set_by_name` or a `CollectionHandle`. Each of
//! them stores the value first, then submits a relation to the graph, which
//! triggers the inference pass (see `inference`).
//!
//! Collection insertions relate the *root* identities of owner and element;
//! single-valued assignments relate the objects as given.

use crate::class_diagram::ClassDiagram;
use crate::config::KnowledgeBaseConfig;
use crate::graph::{GraphSweep, SymbolGraph};
use crate::property::PropertyCatalog;
use crate::property::descriptor::{DescriptorTable, PropertyDescriptor};
use crate::property::monitored::{ContainerRegistry, MonitoredCollection, MonitoredKind};
use crate::query::RelationQuery;
use crate::relation::Relation;
use crate::role::RoleRegistry;
use crate::symbol::Symbol;
use crate::types::{
    ClassId, ContainerKind, FieldId, FieldShape, NodeId, OntographError, PropertyId, Result,
};
use tracing::{debug, info, trace};

// =============================================================================
// VALUES AND REPORTS
// =============================================================================

/// A value assigned to a relation field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A single symbol, for single-valued fields.
    One(Symbol),
    /// A container of symbols, for collection fields.
    Many(ContainerKind, Vec<Symbol>),
}

impl FieldValue {
    /// A set container.
    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Symbol>) -> Self {
        Self::Many(ContainerKind::Set, items.into_iter().collect())
    }

    /// A list container.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Symbol>) -> Self {
        Self::Many(ContainerKind::List, items.into_iter().collect())
    }
}

impl From<Symbol> for FieldValue {
    fn from(symbol: Symbol) -> Self {
        Self::One(symbol)
    }
}

impl From<&Symbol> for FieldValue {
    fn from(symbol: &Symbol) -> Self {
        Self::One(symbol.clone())
    }
}

/// What `KnowledgeBase::sweep` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub nodes_removed: usize,
    pub relations_removed: usize,
    /// Descriptor entries whose owner was gone.
    pub bindings_removed: usize,
    /// Role registry entries dropped (0 when pruning is disabled).
    pub roles_pruned: usize,
}

/// Where an element enters a monitored collection.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Placement {
    Append,
    At(usize),
    Replace(usize),
}

// =============================================================================
// KNOWLEDGE BASE
// =============================================================================

/// An in-process knowledge graph with forward-chaining inference.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    pub(crate) config: KnowledgeBaseConfig,
    pub(crate) diagram: ClassDiagram,
    pub(crate) catalog: PropertyCatalog,
    pub(crate) descriptors: DescriptorTable,
    pub(crate) containers: ContainerRegistry,
    pub(crate) roles: RoleRegistry,
    pub(crate) graph: SymbolGraph,
}

impl KnowledgeBase {
    /// Create an empty knowledge base with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty knowledge base with `config`.
    #[must_use]
    pub fn with_config(config: KnowledgeBaseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &KnowledgeBaseConfig {
        &self.config
    }

    /// Declared classes.
    #[must_use]
    pub fn classes(&self) -> &ClassDiagram {
        &self.diagram
    }

    /// Declare classes and fields.
    pub fn classes_mut(&mut self) -> &mut ClassDiagram {
        &mut self.diagram
    }

    /// Declared property kinds.
    #[must_use]
    pub fn properties(&self) -> &PropertyCatalog {
        &self.catalog
    }

    /// Declare property kinds, inverses, equivalences and chains.
    pub fn properties_mut(&mut self) -> &mut PropertyCatalog {
        &mut self.catalog
    }

    /// Attached descriptors.
    #[must_use]
    pub fn descriptors(&self) -> &DescriptorTable {
        &self.descriptors
    }

    /// Register additional monitored container kinds.
    pub fn containers_mut(&mut self) -> &mut ContainerRegistry {
        &mut self.containers
    }

    /// The symbol graph (read-only).
    #[must_use]
    pub fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    /// The role registry (read-only).
    #[must_use]
    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    // =========================================================================
    // DECLARATIONS
    // =========================================================================

    /// Attach `property` to the declared field `field_name` of `domain`.
    pub fn attach(&mut self, property: PropertyId, domain: ClassId, field_name: &str) -> Result<FieldId> {
        let field = self
            .descriptors
            .attach(&self.diagram, &self.catalog, property, domain, field_name)?;
        debug!(
            property = %self.catalog.name_of(property),
            domain = %self.diagram.name_of(domain),
            field = field_name,
            "descriptor attached"
        );
        Ok(field)
    }

    /// The descriptor of the field `name` as seen from `class`.
    ///
    /// Searches the class MRO first, then the MRO of each role-taker type.
    pub fn field(&self, class: ClassId, name: &str) -> Result<FieldId> {
        let unknown = || OntographError::UnknownField {
            field: name.to_string(),
            owner_type: self.diagram.name_of(class),
        };
        let name_id = self.diagram.name_id(name).ok_or_else(unknown)?;
        std::iter::once(class)
            .chain(self.diagram.all_role_taker_types(class))
            .find_map(|c| self.descriptors.for_name(&self.diagram, c, name_id))
            .ok_or_else(unknown)
    }

    // =========================================================================
    // INSTANCES
    // =========================================================================

    /// Create an instance of a plain class and register it as a node.
    pub fn create(&mut self, class: ClassId, label: impl Into<String>) -> Result<Symbol> {
        let info = self.diagram.class(class)?;
        if let Some(taker) = info.role_taker_type() {
            return Err(OntographError::RoleTakerMismatch {
                role: info.name().to_string(),
                expected: self.diagram.name_of(taker),
                found: "no role-taker".to_string(),
            });
        }
        let symbol = Symbol::new(class, info.name(), label);
        self.graph.add_instance(&symbol);
        Ok(symbol)
    }

    /// Create a role of class `role_class` over `taker` and register it.
    pub fn create_role(
        &mut self,
        role_class: ClassId,
        taker: &Symbol,
        label: impl Into<String>,
    ) -> Result<Symbol> {
        let info = self.diagram.class(role_class)?;
        let Some(expected) = info.role_taker_type() else {
            return Err(OntographError::NotARoleClass(info.name().to_string()));
        };
        if !self.diagram.issubclass_or_role(taker.class(), expected) {
            return Err(OntographError::RoleTakerMismatch {
                role: info.name().to_string(),
                expected: self.diagram.name_of(expected),
                found: taker.type_name().to_string(),
            });
        }
        let role = Symbol::new_role(role_class, info.name(), label, taker);
        self.roles.register(&role);
        self.graph.add_instance(&role);
        Ok(role)
    }

    /// Register an externally constructed symbol as a node.
    pub fn add_instance(&mut self, symbol: &Symbol) -> NodeId {
        self.graph.add_instance(symbol)
    }

    /// Live instances of `class` and of every subclass.
    #[must_use]
    pub fn instances_of(&self, class: ClassId) -> Vec<Symbol> {
        self.diagram
            .subclasses_of(class)
            .into_iter()
            .flat_map(|c| self.graph.nodes_of_class(c))
            .filter_map(|node| self.graph.symbol(node))
            .collect()
    }

    /// Remove the node of `symbol` and every relation touching it.
    pub fn remove_instance(&mut self, symbol: &Symbol) -> bool {
        self.graph
            .node_of(symbol)
            .is_some_and(|node| self.graph.remove_node(node))
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Assign a relation field.
    ///
    /// A single value is stored and related directly. A container replaces the
    /// previous collection and is re-populated element by element, so every
    /// element insertion is a separate unit of inference.
    pub fn set(&mut self, owner: &Symbol, field: FieldId, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        let descriptor = self.descriptors.get(field)?;
        self.check_owner(owner, descriptor)?;
        match (descriptor.shape(), value) {
            (FieldShape::Single, FieldValue::One(target)) => {
                self.descriptors.get_mut(field)?.store_single(owner, &target);
                trace!(owner = %owner, target = %target, field = field.0, "single value set");
                self.submit(owner, &target, field, None)
            }
            (FieldShape::Collection(_), FieldValue::Many(container, items)) => {
                let kind = self.monitored_kind(descriptor, container, owner)?;
                self.descriptors.get_mut(field)?.replace_collection(owner, kind);
                for item in &items {
                    self.insert_element(owner, field, item, Placement::Append)?;
                }
                Ok(())
            }
            (FieldShape::Single, FieldValue::Many(..)) => {
                Err(shape_mismatch(descriptor, owner, "a single value"))
            }
            (FieldShape::Collection(_), FieldValue::One(_)) => {
                Err(shape_mismatch(descriptor, owner, "a collection"))
            }
        }
    }

    /// Assign a relation field by name (role-aware lookup).
    pub fn set_by_name(&mut self, owner: &Symbol, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let field = self.field(owner.class(), name)?;
        self.set(owner, field, value)
    }

    /// The collection of a collection-valued field, bound to `owner`.
    pub fn collection(&mut self, owner: &Symbol, field: FieldId) -> Result<CollectionHandle<'_>> {
        let descriptor = self.descriptors.get(field)?;
        self.check_owner(owner, descriptor)?;
        if !descriptor.shape().is_collection() {
            return Err(shape_mismatch(descriptor, owner, "a single value"));
        }
        Ok(CollectionHandle {
            kb: self,
            owner: owner.clone(),
            field,
        })
    }

    /// The collection of the field named `name`, bound to `owner`.
    pub fn collection_by_name(&mut self, owner: &Symbol, name: &str) -> Result<CollectionHandle<'_>> {
        let field = self.field(owner.class(), name)?;
        self.collection(owner, field)
    }

    /// Store `value` for `owner` without touching the graph.
    ///
    /// Returns whether the stored value changed. The inference engine uses
    /// this to prune relations it has already propagated.
    pub fn update_value(
        &mut self,
        owner: &Symbol,
        field: FieldId,
        value: &Symbol,
        inferred: bool,
    ) -> Result<bool> {
        let changed = match self.descriptors.get(field)?.shape() {
            FieldShape::Single => self.descriptors.get_mut(field)?.store_single(owner, value),
            FieldShape::Collection(default) => self.collection_slot(owner, field, default)?.push(value),
        };
        trace!(owner = %owner, value = %value, field = field.0, inferred, changed, "value updated");
        Ok(changed)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// The single value of `field` for `owner`.
    pub fn value(&self, owner: &Symbol, field: FieldId) -> Result<Option<Symbol>> {
        Ok(self.descriptors.get(field)?.single(owner))
    }

    /// Every value of `field` for `owner`, whatever its shape.
    pub fn values(&self, owner: &Symbol, field: FieldId) -> Result<Vec<Symbol>> {
        Ok(self.descriptors.get(field)?.values(owner))
    }

    /// Every value of the field named `name`, looked up along the role-taker chain.
    pub fn get_by_name(&self, owner: &Symbol, name: &str) -> Result<Vec<Symbol>> {
        match self.field(owner.class(), name) {
            Ok(field) => self.values(owner, field),
            Err(_) => Err(OntographError::MissingAttribute {
                attribute: name.to_string(),
                owner_type: owner.type_name().to_string(),
            }),
        }
    }

    /// Whether `value` is stored in `field` for `owner`.
    pub fn holds(&self, owner: &Symbol, field: FieldId, value: &Symbol) -> Result<bool> {
        Ok(self.descriptors.get(field)?.holds(owner, value))
    }

    /// Run a read-only relation query.
    #[must_use]
    pub fn query(&self, query: &RelationQuery) -> Vec<Relation> {
        query.run(&self.graph, &self.catalog)
    }

    // =========================================================================
    // HOUSEKEEPING
    // =========================================================================

    /// Drop nodes, values and (unless disabled) role entries of dead objects.
    pub fn sweep(&mut self) -> SweepReport {
        let GraphSweep {
            nodes_removed,
            relations_removed,
        } = self.graph.sweep();
        let bindings_removed = self
            .descriptors
            .iter_mut()
            .map(PropertyDescriptor::sweep_store)
            .sum();
        let roles_pruned = if self.config.prune_role_registry {
            self.roles.prune()
        } else {
            0
        };
        let report = SweepReport {
            nodes_removed,
            relations_removed,
            bindings_removed,
            roles_pruned,
        };
        info!(
            nodes = nodes_removed,
            relations = relations_removed,
            bindings = bindings_removed,
            roles = roles_pruned,
            "sweep finished"
        );
        report
    }

    /// Drop all instance data. Declarations and domain/range maps survive.
    pub fn reset(&mut self) {
        self.graph.clear();
        for descriptor in self.descriptors.iter_mut() {
            descriptor.clear_store();
        }
        self.roles.clear();
        info!("knowledge base reset");
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn check_owner(&self, owner: &Symbol, descriptor: &PropertyDescriptor) -> Result<()> {
        if self.diagram.issubclass_or_role(owner.class(), descriptor.domain()) {
            return Ok(());
        }
        Err(OntographError::UnknownField {
            field: descriptor.field_name().to_string(),
            owner_type: owner.type_name().to_string(),
        })
    }

    fn monitored_kind(
        &self,
        descriptor: &PropertyDescriptor,
        container: ContainerKind,
        owner: &Symbol,
    ) -> Result<MonitoredKind> {
        self.containers
            .monitored_for(container)
            .ok_or_else(|| OntographError::UnsupportedContainer {
                field: descriptor.field_name().to_string(),
                owner_type: owner.type_name().to_string(),
                container: container.name().to_string(),
            })
    }

    /// The collection of `owner` under `field`, created with the field's
    /// default container when absent.
    fn collection_slot(
        &mut self,
        owner: &Symbol,
        field: FieldId,
        default: ContainerKind,
    ) -> Result<&mut MonitoredCollection> {
        let descriptor = self.descriptors.get(field)?;
        let kind = match descriptor.collection(owner) {
            Some(items) => items.kind(),
            None => self.monitored_kind(descriptor, default, owner)?,
        };
        let mismatch = shape_mismatch(descriptor, owner, "a single value");
        self.descriptors
            .get_mut(field)?
            .collection_or_insert(owner, kind)
            .ok_or(mismatch)
    }

    /// Insert one element into a collection field and relate it.
    ///
    /// The element is first resolved against the declared range through the
    /// role overlay. When `owner` is a role, the element is also stored in the
    /// same-named field of each role-taker that has its own descriptor.
    pub(crate) fn insert_element(
        &mut self,
        owner: &Symbol,
        field: FieldId,
        value: &Symbol,
        placement: Placement,
    ) -> Result<bool> {
        let descriptor = self.descriptors.get(field)?;
        let FieldShape::Collection(default) = descriptor.shape() else {
            return Err(shape_mismatch(descriptor, owner, "a single value"));
        };
        let range = self.element_range(descriptor);
        let element = self.resolve_element(value, range);
        let items = self.collection_slot(owner, field, default)?;
        let changed = match placement {
            Placement::Append => items.push(&element),
            Placement::At(index) => items.insert_at(index, &element),
            Placement::Replace(index) => items.replace_at(index, &element).is_some(),
        };
        self.propagate_to_takers(owner, field, &element)?;
        self.submit(owner, &element, field, None)?;
        Ok(changed)
    }

    /// The most specific range declared for the descriptor's property kind
    /// across all of its domains.
    fn element_range(&self, descriptor: &PropertyDescriptor) -> ClassId {
        let ranges: Vec<ClassId> = self
            .descriptors
            .all_ranges(descriptor.property())
            .into_iter()
            .collect();
        if ranges.len() < 2 {
            return descriptor.range();
        }
        self.diagram
            .sort_by_role_aware_path_length(&ranges)
            .last()
            .copied()
            .unwrap_or_else(|| descriptor.range())
    }

    /// The object to store for `value` in a field whose range is `range`:
    /// `value` itself when it fits, else the first role wrapping it that does,
    /// else the first role-taker that does.
    fn resolve_element(&self, value: &Symbol, range: ClassId) -> Symbol {
        if self.diagram.issubclass_or_role(value.class(), range) {
            return value.clone();
        }
        self.roles
            .roles_of(value)
            .into_iter()
            .chain(value.role_taker_chain())
            .find(|candidate| self.diagram.issubclass_or_role(candidate.class(), range))
            .unwrap_or_else(|| value.clone())
    }

    fn propagate_to_takers(&mut self, owner: &Symbol, field: FieldId, element: &Symbol) -> Result<()> {
        let name = self.descriptors.get(field)?.name();
        for taker in owner.role_taker_chain() {
            let Some(taker_field) = self.descriptors.for_name(&self.diagram, taker.class(), name) else {
                continue;
            };
            if taker_field == field {
                continue;
            }
            if let FieldShape::Collection(default) = self.descriptors.get(taker_field)?.shape() {
                self.collection_slot(&taker, taker_field, default)?.push(element);
            }
        }
        Ok(())
    }
}

fn shape_mismatch(descriptor: &PropertyDescriptor, owner: &Symbol, expected: &'static str) -> OntographError {
    OntographError::ShapeMismatch {
        field: descriptor.field_name().to_string(),
        owner_type: owner.type_name().to_string(),
        expected,
    }
}

// =============================================================================
// COLLECTION HANDLE
// =============================================================================

/// A collection field bound to its owner.
///
/// Every insertion goes through the knowledge base and triggers inference.
/// Removal and clearing only edit the stored collection: relations already
/// in the graph stay, and nothing is retracted.
#[derive(Debug)]
pub struct CollectionHandle<'kb> {
    kb: &'kb mut KnowledgeBase,
    owner: Symbol,
    field: FieldId,
}

impl CollectionHandle<'_> {
    /// The owner this collection is bound to.
    #[must_use]
    pub fn owner(&self) -> &Symbol {
        &self.owner
    }

    #[must_use]
    pub fn field(&self) -> FieldId {
        self.field
    }

    /// Add an element. Returns whether the collection changed.
    pub fn add(&mut self, value: &Symbol) -> Result<bool> {
        self.kb
            .insert_element(&self.owner, self.field, value, Placement::Append)
    }

    /// Add every element in order. Returns how many were new.
    pub fn extend<'a>(&mut self, values: impl IntoIterator<Item = &'a Symbol>) -> Result<usize> {
        let mut added = 0;
        for value in values {
            if self.add(value)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Insert at `index` (clamped to the length). Lists only.
    pub fn insert(&mut self, index: usize, value: &Symbol) -> Result<bool> {
        self.require_list("insert")?;
        self.kb
            .insert_element(&self.owner, self.field, value, Placement::At(index))
    }

    /// Replace the element at `index`. Lists only.
    pub fn replace(&mut self, index: usize, value: &Symbol) -> Result<()> {
        self.require_list("replace")?;
        let len = self.len();
        if index >= len {
            let descriptor = self.kb.descriptors.get(self.field)?;
            return Err(OntographError::IndexOutOfBounds {
                field: descriptor.field_name().to_string(),
                owner_type: self.owner.type_name().to_string(),
                index,
                len,
            });
        }
        self.kb
            .insert_element(&self.owner, self.field, value, Placement::Replace(index))?;
        Ok(())
    }

    /// Remove an element (root identity). Relations are not retracted.
    pub fn remove(&mut self, value: &Symbol) -> Result<bool> {
        Ok(self
            .kb
            .descriptors
            .get_mut(self.field)?
            .collection_mut(&self.owner)
            .is_some_and(|items| items.remove(value)))
    }

    /// Remove every element. Relations are not retracted.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(items) = self
            .kb
            .descriptors
            .get_mut(self.field)?
            .collection_mut(&self.owner)
        {
            items.clear();
        }
        Ok(())
    }

    /// Whether an element with the same root identity is present.
    #[must_use]
    pub fn contains(&self, value: &Symbol) -> bool {
        self.stored().is_some_and(|items| items.contains(value))
    }

    /// Live elements in order.
    #[must_use]
    pub fn items(&self) -> Vec<Symbol> {
        self.stored().map(MonitoredCollection::items).unwrap_or_default()
    }

    /// Number of stored elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stored().map_or(0, MonitoredCollection::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stored(&self) -> Option<&MonitoredCollection> {
        self.kb
            .descriptors
            .get(self.field)
            .ok()?
            .collection(&self.owner)
    }

    fn require_list(&self, operation: &'static str) -> Result<()> {
        let descriptor = self.kb.descriptors.get(self.field)?;
        let kind = match (self.stored(), descriptor.shape()) {
            (Some(items), _) => items.kind(),
            (None, FieldShape::Collection(default)) => {
                self.kb.monitored_kind(descriptor, default, &self.owner)?
            }
            (None, FieldShape::Single) => return Err(shape_mismatch(descriptor, &self.owner, "a single value")),
        };
        if kind == MonitoredKind::List {
            return Ok(());
        }
        Err(OntographError::UnsupportedOperation {
            field: descriptor.field_name().to_string(),
            owner_type: self.owner.type_name().to_string(),
            operation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertySpec;

    struct Fixture {
        kb: KnowledgeBase,
        person: ClassId,
        company: ClassId,
        manager: ClassId,
        employer: FieldId,
        colleagues: FieldId,
        reports: FieldId,
    }

    fn fixture() -> Fixture {
        let mut kb = KnowledgeBase::new();
        let diagram = kb.classes_mut();
        let person = diagram.declare_class("Person", &[]).expect("Person");
        let company = diagram.declare_class("Company", &[]).expect("Company");
        let manager = diagram.declare_role("Manager", person, &[]).expect("Manager");
        diagram
            .declare_field(person, "employer", company, FieldShape::Single)
            .expect("employer");
        diagram
            .declare_field(person, "colleagues", person, FieldShape::Collection(ContainerKind::Set))
            .expect("colleagues");
        diagram
            .declare_field(manager, "reports", person, FieldShape::Collection(ContainerKind::List))
            .expect("reports");

        let catalog = kb.properties_mut();
        let employed_by = catalog.declare("EmployedBy", PropertySpec::new()).expect("EmployedBy");
        let colleague_of = catalog.declare("ColleagueOf", PropertySpec::new()).expect("ColleagueOf");
        let manages = catalog.declare("Manages", PropertySpec::new()).expect("Manages");

        let employer = kb.attach(employed_by, person, "employer").expect("attach employer");
        let colleagues = kb.attach(colleague_of, person, "colleagues").expect("attach colleagues");
        let reports = kb.attach(manages, manager, "reports").expect("attach reports");
        Fixture {
            kb,
            person,
            company,
            manager,
            employer,
            colleagues,
            reports,
        }
    }

    #[test]
    fn single_assignment_stores_and_relates() {
        let mut f = fixture();
        let ann = f.kb.create(f.person, "ann").expect("ann");
        let acme = f.kb.create(f.company, "acme").expect("acme");
        f.kb.set(&ann, f.employer, &acme).expect("set");

        assert_eq!(f.kb.value(&ann, f.employer).expect("value"), Some(acme.clone()));
        assert_eq!(f.kb.graph().relation_count(), 1);
        let relation = f.kb.graph().relations().next().expect("relation");
        assert!(!relation.inferred);
    }

    #[test]
    fn shape_and_container_are_checked() {
        let mut f = fixture();
        let ann = f.kb.create(f.person, "ann").expect("ann");
        let bob = f.kb.create(f.person, "bob").expect("bob");

        let wrong_shape = f.kb.set(&ann, f.colleagues, &bob);
        assert!(matches!(wrong_shape, Err(OntographError::ShapeMismatch { .. })));

        let deque = f
            .kb
            .set(&ann, f.colleagues, FieldValue::Many(ContainerKind::Deque, vec![bob.clone()]));
        assert!(matches!(deque, Err(OntographError::UnsupportedContainer { .. })));

        f.kb.containers_mut()
            .register(ContainerKind::Deque, MonitoredKind::List);
        f.kb.set(&ann, f.colleagues, FieldValue::Many(ContainerKind::Deque, vec![bob.clone()]))
            .expect("registered deque");
        assert_eq!(f.kb.values(&ann, f.colleagues).expect("values"), vec![bob]);
    }

    #[test]
    fn reassigning_a_collection_replaces_it() {
        let mut f = fixture();
        let ann = f.kb.create(f.person, "ann").expect("ann");
        let bob = f.kb.create(f.person, "bob").expect("bob");
        let cy = f.kb.create(f.person, "cy").expect("cy");
        f.kb.set(&ann, f.colleagues, FieldValue::set([bob.clone()])).expect("first");
        f.kb.set(&ann, f.colleagues, FieldValue::set([cy.clone()])).expect("second");
        assert_eq!(f.kb.values(&ann, f.colleagues).expect("values"), vec![cy]);
        // the earlier relation is not retracted
        assert_eq!(f.kb.graph().relation_count(), 2);
    }

    #[test]
    fn set_operations_reject_positional_access() {
        let mut f = fixture();
        let ann = f.kb.create(f.person, "ann").expect("ann");
        let bob = f.kb.create(f.person, "bob").expect("bob");
        let mut colleagues = f.kb.collection(&ann, f.colleagues).expect("collection");
        let result = colleagues.insert(0, &bob);
        assert!(matches!(result, Err(OntographError::UnsupportedOperation { operation: "insert", .. })));
        assert!(colleagues.add(&bob).expect("add"));
        assert!(!colleagues.add(&bob).expect("add again"));
        assert!(colleagues.remove(&bob).expect("remove"));
        assert!(colleagues.is_empty());
    }

    #[test]
    fn list_replace_checks_bounds() {
        let mut f = fixture();
        let ann = f.kb.create(f.person, "ann").expect("ann");
        let boss = f.kb.create_role(f.manager, &ann, "boss").expect("boss");
        let bob = f.kb.create(f.person, "bob").expect("bob");
        let cy = f.kb.create(f.person, "cy").expect("cy");

        let mut reports = f.kb.collection(&boss, f.reports).expect("reports");
        let out_of_bounds = reports.replace(0, &bob);
        assert!(matches!(out_of_bounds, Err(OntographError::IndexOutOfBounds { len: 0, .. })));
        reports.add(&bob).expect("add");
        reports.replace(0, &cy).expect("replace");
        assert_eq!(reports.items(), vec![cy]);
    }

    #[test]
    fn roles_are_validated_against_their_taker_type() {
        let mut f = fixture();
        let acme = f.kb.create(f.company, "acme").expect("acme");
        let mismatch = f.kb.create_role(f.manager, &acme, "m");
        assert!(matches!(mismatch, Err(OntographError::RoleTakerMismatch { .. })));

        let not_role = f.kb.create_role(f.person, &acme, "p");
        assert!(matches!(not_role, Err(OntographError::NotARoleClass(_))));

        let direct = f.kb.create(f.manager, "m");
        assert!(matches!(direct, Err(OntographError::RoleTakerMismatch { .. })));
    }

    #[test]
    fn field_lookup_falls_back_to_taker_types() {
        let f = fixture();
        assert_eq!(f.kb.field(f.manager, "employer").expect("employer"), f.employer);
        assert_eq!(f.kb.field(f.manager, "reports").expect("reports"), f.reports);
        assert!(matches!(
            f.kb.field(f.person, "reports"),
            Err(OntographError::UnknownField { .. })
        ));
    }

    #[test]
    fn get_by_name_reports_missing_attribute() {
        let mut f = fixture();
        let ann = f.kb.create(f.person, "ann").expect("ann");
        let boss = f.kb.create_role(f.manager, &ann, "boss").expect("boss");
        let acme = f.kb.create(f.company, "acme").expect("acme");
        f.kb.set_by_name(&boss, "employer", &acme).expect("set through role");

        assert_eq!(f.kb.get_by_name(&ann, "employer").expect("read"), vec![acme]);
        let missing = f.kb.get_by_name(&ann, "salary");
        assert!(matches!(missing, Err(OntographError::MissingAttribute { .. })));
    }

    #[test]
    fn sweep_and_reset_drop_instance_data() {
        let mut f = fixture();
        let ann = f.kb.create(f.person, "ann").expect("ann");
        {
            let bob = f.kb.create(f.person, "bob").expect("bob");
            let _boss = f.kb.create_role(f.manager, &bob, "boss").expect("boss");
            f.kb.set(&bob, f.colleagues, FieldValue::set([ann.clone()])).expect("set");
        }
        let report = f.kb.sweep();
        assert_eq!(report.nodes_removed, 2);
        assert_eq!(report.relations_removed, 1);
        assert_eq!(report.bindings_removed, 1);
        assert_eq!(report.roles_pruned, 1);
        assert_eq!(f.kb.instances_of(f.person), vec![ann.clone()]);

        f.kb.reset();
        assert_eq!(f.kb.graph().node_count(), 0);
        assert!(f.kb.attach(PropertyId(0), f.person, "employer").is_err());
    }
}
