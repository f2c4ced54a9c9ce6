//! # Property Catalog
//!
//! Declared property kinds and their semantics.
//!
//! A property kind is the type of a relation field (e.g. `WorksFor`). Kinds
//! form a hierarchy through their super-properties and carry:
//! - semantics flags (transitive, symmetric, asymmetric, reflexive, irreflexive)
//! - an optional inverse, declared pairwise and inherited by sub-properties
//! - equivalent kinds, declared pairwise
//! - chain axioms `(links...) -> target`
//!
//! Transitivity and symmetry are inherited by sub-properties.
//!
//! Submodules:
//! - `descriptor`: binds a kind to one field of one class and stores values
//! - `monitored`: collection values that report every insertion

pub mod descriptor;
pub mod monitored;

use crate::primitives::MAX_CHAIN_LENGTH;
use crate::types::{OntographError, PropertyId, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// SEMANTICS
// =============================================================================

/// Declared relation semantics of a property kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Semantics {
    pub transitive: bool,
    pub symmetric: bool,
    pub asymmetric: bool,
    pub reflexive: bool,
    pub irreflexive: bool,
}

impl Semantics {
    /// No semantics.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            transitive: false,
            symmetric: false,
            asymmetric: false,
            reflexive: false,
            irreflexive: false,
        }
    }

    #[must_use]
    pub const fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }

    #[must_use]
    pub const fn symmetric(mut self) -> Self {
        self.symmetric = true;
        self
    }

    #[must_use]
    pub const fn asymmetric(mut self) -> Self {
        self.asymmetric = true;
        self
    }

    #[must_use]
    pub const fn reflexive(mut self) -> Self {
        self.reflexive = true;
        self
    }

    #[must_use]
    pub const fn irreflexive(mut self) -> Self {
        self.irreflexive = true;
        self
    }

    fn check(self, property: &str) -> Result<()> {
        let conflict = |first, second| OntographError::ConflictingSemantics {
            property: property.to_string(),
            first,
            second,
        };
        if self.symmetric && self.asymmetric {
            return Err(conflict("symmetric", "asymmetric"));
        }
        if self.reflexive && self.irreflexive {
            return Err(conflict("reflexive", "irreflexive"));
        }
        Ok(())
    }
}

// =============================================================================
// PROPERTY KINDS
// =============================================================================

/// Declaration input for a property kind.
#[derive(Debug, Clone, Default)]
pub struct PropertySpec {
    /// Direct super-properties.
    pub supers: Vec<PropertyId>,
    /// Semantics declared on this kind (inherited flags are added automatically).
    pub semantics: Semantics,
}

impl PropertySpec {
    /// A kind with no super-properties and no semantics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a direct super-property.
    #[must_use]
    pub fn with_super(mut self, parent: PropertyId) -> Self {
        self.supers.push(parent);
        self
    }

    /// Set the declared semantics.
    #[must_use]
    pub fn with_semantics(mut self, semantics: Semantics) -> Self {
        self.semantics = semantics;
        self
    }
}

/// A declared property kind.
#[derive(Debug, Clone)]
pub struct PropertyKind {
    id: PropertyId,
    name: String,
    supers: Vec<PropertyId>,
    semantics: Semantics,
    inverse: Option<PropertyId>,
    equivalents: BTreeSet<PropertyId>,
}

impl PropertyKind {
    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct super-properties, in declaration order.
    #[must_use]
    pub fn supers(&self) -> &[PropertyId] {
        &self.supers
    }

    /// Effective semantics (declared plus inherited).
    #[must_use]
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    /// Inverse declared on this kind itself.
    #[must_use]
    pub fn declared_inverse(&self) -> Option<PropertyId> {
        self.inverse
    }
}

/// A chain axiom: following `links` head to tail implies `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAxiom {
    pub target: PropertyId,
    pub links: Vec<PropertyId>,
}

// =============================================================================
// CATALOG
// =============================================================================

/// Registry of property kinds, inverses, equivalences and chain axioms.
#[derive(Debug, Clone, Default)]
pub struct PropertyCatalog {
    kinds: Vec<PropertyKind>,
    by_name: BTreeMap<String, PropertyId>,
    chains: Vec<ChainAxiom>,
}

impl PropertyCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property kind.
    pub fn declare(&mut self, name: &str, spec: PropertySpec) -> Result<PropertyId> {
        if self.by_name.contains_key(name) {
            return Err(OntographError::DuplicateProperty(name.to_string()));
        }
        let mut semantics = spec.semantics;
        for parent in &spec.supers {
            let inherited = self.kind(*parent)?.semantics;
            // only transitivity and symmetry flow down to sub-properties
            semantics.transitive |= inherited.transitive;
            semantics.symmetric |= inherited.symmetric;
        }
        semantics.check(name)?;

        let id = PropertyId(self.kinds.len() as u32);
        self.kinds.push(PropertyKind {
            id,
            name: name.to_string(),
            supers: spec.supers,
            semantics,
            inverse: None,
            equivalents: BTreeSet::new(),
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Declare `a` and `b` inverses of each other.
    pub fn set_inverse(&mut self, a: PropertyId, b: PropertyId) -> Result<()> {
        self.kind(b)?;
        self.kind_mut(a)?.inverse = Some(b);
        self.kind_mut(b)?.inverse = Some(a);
        Ok(())
    }

    /// Declare `a` and `b` equivalent.
    pub fn add_equivalent(&mut self, a: PropertyId, b: PropertyId) -> Result<()> {
        if a == b {
            return Ok(());
        }
        self.kind(b)?;
        self.kind_mut(a)?.equivalents.insert(b);
        self.kind_mut(b)?.equivalents.insert(a);
        Ok(())
    }

    /// Register a chain axiom `(links...) -> target`.
    pub fn add_chain_axiom(&mut self, target: PropertyId, links: &[PropertyId]) -> Result<()> {
        let target_name = self.kind(target)?.name.clone();
        if links.is_empty() {
            return Err(OntographError::InvalidChainAxiom {
                target: target_name,
                reason: "a chain needs at least one link".to_string(),
            });
        }
        if links.len() > MAX_CHAIN_LENGTH {
            return Err(OntographError::InvalidChainAxiom {
                target: target_name,
                reason: format!("{} links exceed the limit of {}", links.len(), MAX_CHAIN_LENGTH),
            });
        }
        for link in links {
            self.kind(*link)?;
        }
        let axiom = ChainAxiom {
            target,
            links: links.to_vec(),
        };
        if !self.chains.contains(&axiom) {
            self.chains.push(axiom);
        }
        Ok(())
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Get a kind by id.
    pub fn kind(&self, id: PropertyId) -> Result<&PropertyKind> {
        self.kinds
            .get(id.0 as usize)
            .ok_or_else(|| OntographError::UnknownProperty(format!("{id:?}")))
    }

    fn kind_mut(&mut self, id: PropertyId) -> Result<&mut PropertyKind> {
        self.kinds
            .get_mut(id.0 as usize)
            .ok_or_else(|| OntographError::UnknownProperty(format!("{id:?}")))
    }

    /// Find a kind by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<PropertyId> {
        self.by_name.get(name).copied()
    }

    /// Name of a kind, or a debug rendering of the id if it is unknown.
    #[must_use]
    pub fn name_of(&self, id: PropertyId) -> String {
        self.kinds
            .get(id.0 as usize)
            .map(|k| k.name.clone())
            .unwrap_or_else(|| format!("{id:?}"))
    }

    /// All kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = &PropertyKind> {
        self.kinds.iter()
    }

    /// Effective semantics of a kind (none for unknown ids).
    #[must_use]
    pub fn semantics(&self, id: PropertyId) -> Semantics {
        self.kinds
            .get(id.0 as usize)
            .map(|k| k.semantics)
            .unwrap_or_default()
    }

    /// Direct super-properties of a kind.
    #[must_use]
    pub fn direct_supers(&self, id: PropertyId) -> &[PropertyId] {
        self.kinds
            .get(id.0 as usize)
            .map(|k| k.supers.as_slice())
            .unwrap_or(&[])
    }

    /// The kind itself followed by every super-property, breadth first.
    #[must_use]
    pub fn ancestors(&self, id: PropertyId) -> Vec<PropertyId> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if out.contains(&current) {
                continue;
            }
            out.push(current);
            queue.extend(self.direct_supers(current).iter().copied());
        }
        out
    }

    /// Reflexive, transitive sub-property test.
    #[must_use]
    pub fn is_subproperty(&self, sub: PropertyId, sup: PropertyId) -> bool {
        sub == sup || self.ancestors(sub).contains(&sup)
    }

    /// Inverse of a kind: its own, else the nearest inherited one.
    #[must_use]
    pub fn inverse_of(&self, id: PropertyId) -> Option<PropertyId> {
        self.ancestors(id)
            .into_iter()
            .find_map(|p| self.kinds.get(p.0 as usize)?.inverse)
    }

    /// Kinds declared equivalent to this one.
    #[must_use]
    pub fn equivalents(&self, id: PropertyId) -> Vec<PropertyId> {
        self.kinds
            .get(id.0 as usize)
            .map(|k| k.equivalents.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every registered chain axiom.
    #[must_use]
    pub fn chain_axioms(&self) -> &[ChainAxiom] {
        &self.chains
    }

    /// Every `(axiom, link index)` at which a relation of kind `id` can stand.
    #[must_use]
    pub fn chain_participations(&self, id: PropertyId) -> Vec<(&ChainAxiom, usize)> {
        let mut out = Vec::new();
        for axiom in &self.chains {
            for (index, link) in axiom.links.iter().enumerate() {
                if self.is_subproperty(id, *link) {
                    out.push((axiom, index));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantics_inherit_transitivity_and_symmetry() {
        let mut catalog = PropertyCatalog::new();
        let part_of = catalog
            .declare("PartOf", PropertySpec::new().with_semantics(Semantics::none().transitive().irreflexive()))
            .expect("PartOf");
        let component_of = catalog
            .declare("ComponentOf", PropertySpec::new().with_super(part_of))
            .expect("ComponentOf");
        let sem = catalog.semantics(component_of);
        assert!(sem.transitive);
        assert!(!sem.irreflexive);
    }

    #[test]
    fn conflicting_semantics_are_rejected() {
        let mut catalog = PropertyCatalog::new();
        let result = catalog.declare(
            "Odd",
            PropertySpec::new().with_semantics(Semantics::none().symmetric().asymmetric()),
        );
        assert!(matches!(result, Err(OntographError::ConflictingSemantics { .. })));

        let knows = catalog
            .declare("Knows", PropertySpec::new().with_semantics(Semantics::none().symmetric()))
            .expect("Knows");
        let inherited = catalog.declare(
            "Dislikes",
            PropertySpec::new()
                .with_super(knows)
                .with_semantics(Semantics::none().asymmetric()),
        );
        assert!(matches!(inherited, Err(OntographError::ConflictingSemantics { .. })));
    }

    #[test]
    fn inverse_is_pairwise_and_inherited() {
        let mut catalog = PropertyCatalog::new();
        let member_of = catalog.declare("MemberOf", PropertySpec::new()).expect("MemberOf");
        let member = catalog.declare("Member", PropertySpec::new()).expect("Member");
        let works_for = catalog
            .declare("WorksFor", PropertySpec::new().with_super(member_of))
            .expect("WorksFor");
        catalog.set_inverse(member_of, member).expect("inverse");

        assert_eq!(catalog.inverse_of(member_of), Some(member));
        assert_eq!(catalog.inverse_of(member), Some(member_of));
        assert_eq!(catalog.inverse_of(works_for), Some(member));
        assert_eq!(catalog.kind(works_for).expect("kind").declared_inverse(), None);
    }

    #[test]
    fn subproperty_is_reflexive_and_transitive() {
        let mut catalog = PropertyCatalog::new();
        let a = catalog.declare("A", PropertySpec::new()).expect("A");
        let b = catalog.declare("B", PropertySpec::new().with_super(a)).expect("B");
        let c = catalog.declare("C", PropertySpec::new().with_super(b)).expect("C");
        assert!(catalog.is_subproperty(c, c));
        assert!(catalog.is_subproperty(c, a));
        assert!(!catalog.is_subproperty(a, c));
        assert_eq!(catalog.ancestors(c), vec![c, b, a]);
    }

    #[test]
    fn chain_axioms_validate_and_report_participation() {
        let mut catalog = PropertyCatalog::new();
        let parent_of = catalog.declare("ParentOf", PropertySpec::new()).expect("ParentOf");
        let ancestor_of = catalog.declare("AncestorOf", PropertySpec::new()).expect("AncestorOf");

        let empty = catalog.add_chain_axiom(ancestor_of, &[]);
        assert!(matches!(empty, Err(OntographError::InvalidChainAxiom { .. })));

        catalog
            .add_chain_axiom(ancestor_of, &[parent_of, parent_of])
            .expect("chain 1");
        catalog
            .add_chain_axiom(ancestor_of, &[parent_of, ancestor_of])
            .expect("chain 2");
        catalog
            .add_chain_axiom(ancestor_of, &[parent_of, parent_of])
            .expect("duplicate is a no-op");

        assert_eq!(catalog.chain_axioms().len(), 2);
        let parent_slots: Vec<usize> = catalog
            .chain_participations(parent_of)
            .into_iter()
            .map(|(_, i)| i)
            .collect();
        assert_eq!(parent_slots, vec![0, 1, 0]);
        assert_eq!(catalog.chain_participations(ancestor_of).len(), 1);
    }

    #[test]
    fn equivalence_is_symmetric() {
        let mut catalog = PropertyCatalog::new();
        let a = catalog.declare("Employs", PropertySpec::new()).expect("a");
        let b = catalog.declare("HasEmployee", PropertySpec::new()).expect("b");
        catalog.add_equivalent(a, b).expect("equivalent");
        assert_eq!(catalog.equivalents(a), vec![b]);
        assert_eq!(catalog.equivalents(b), vec![a]);
    }
}
