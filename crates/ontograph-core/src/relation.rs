//! # Relations
//!
//! Directed, field-qualified edges between two graph nodes.
//!
//! Identity is `(source, target, field name)`. The `inferred` flag and the
//! provenance tag are payload only, so admitting the same fact a second time
//! (directly or through any rule) is a no-op.

use crate::types::{FieldId, NameId, NodeId, PropertyId, Provenance};
use serde::Serialize;

/// Identity of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelationKey {
    pub source: NodeId,
    pub target: NodeId,
    pub name: NameId,
}

/// A directed fact `source --field--> target`.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub source: NodeId,
    pub target: NodeId,
    /// Descriptor of the field on the source's type.
    pub field: FieldId,
    /// Field name (part of the identity).
    pub name: NameId,
    /// Property kind of the field.
    pub property: PropertyId,
    /// Whether a rule synthesized this relation.
    pub inferred: bool,
    /// The rule that synthesized it; `None` for direct writes.
    pub provenance: Option<Provenance>,
}

impl Relation {
    /// A relation written directly by the application.
    #[must_use]
    pub fn direct(
        source: NodeId,
        target: NodeId,
        field: FieldId,
        name: NameId,
        property: PropertyId,
    ) -> Self {
        Self {
            source,
            target,
            field,
            name,
            property,
            inferred: false,
            provenance: None,
        }
    }

    /// A relation synthesized by `rule`.
    #[must_use]
    pub fn derived(
        source: NodeId,
        target: NodeId,
        field: FieldId,
        name: NameId,
        property: PropertyId,
        rule: Provenance,
    ) -> Self {
        Self {
            inferred: true,
            provenance: Some(rule),
            ..Self::direct(source, target, field, name, property)
        }
    }

    /// The identity key.
    #[must_use]
    pub fn key(&self) -> RelationKey {
        RelationKey {
            source: self.source,
            target: self.target,
            name: self.name,
        }
    }

    /// Whether this relation was produced by `rule`.
    #[must_use]
    pub fn derived_by(&self, rule: Provenance) -> bool {
        self.provenance == Some(rule)
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Relation {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_inference_payload() {
        let direct = Relation::direct(NodeId(1), NodeId(2), FieldId(0), NameId(3), PropertyId(0));
        let derived = Relation::derived(
            NodeId(1),
            NodeId(2),
            FieldId(5),
            NameId(3),
            PropertyId(4),
            Provenance::Inverse,
        );
        assert_eq!(direct, derived);
        assert!(derived.derived_by(Provenance::Inverse));
        assert!(!direct.derived_by(Provenance::Inverse));
        assert!(derived.inferred && !direct.inferred);
    }

    #[test]
    fn field_name_is_part_of_identity() {
        let a = Relation::direct(NodeId(1), NodeId(2), FieldId(0), NameId(3), PropertyId(0));
        let b = Relation::direct(NodeId(1), NodeId(2), FieldId(0), NameId(4), PropertyId(0));
        assert_ne!(a.key(), b.key());
    }
}
