//! # Inference Engine
//!
//! Forward chaining over admitted relations.
//!
//! Every relation admitted to the graph is queued. The outermost write drains
//! the queue breadth-first and fires the rule pipeline once per relation, in
//! this order:
//!
//! 1. Equivalence: `(s, t, equivalent)`, not re-fired on its own output
//! 2. Super-property: `(s, t, super)` for each direct super-property
//! 3. Inverse: `(t, s, inverse)`, not re-fired on its own output
//! 4. Transitive closure: skipped for symmetric kinds and equivalence output
//! 5. Chain axioms: `(start, end, target)` for every walk through the chain
//! 6. Symmetric mirroring: `(t, s, same kind)`, not re-fired on its own output
//!
//! A synthesized relation is first written with `update_value`; when the
//! stored value did not change it is dropped, otherwise it is admitted and
//! queued. Admission is idempotent by `(source, target, field name)`, so a
//! pass ends once no rule yields a new edge. Writes made while a pass is
//! running only enqueue, keeping the stack depth independent of closure size.

use crate::config::InversePolicy;
use crate::knowledge::KnowledgeBase;
use crate::relation::Relation;
use crate::symbol::Symbol;
use crate::types::{FieldId, NodeId, OntographError, PropertyId, Provenance, Result};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Rules in firing order.
const FIRING_ORDER: [Provenance; 6] = [
    Provenance::Equivalent,
    Provenance::Super,
    Provenance::Inverse,
    Provenance::Transitive,
    Provenance::Chain,
    Provenance::Symmetry,
];

impl KnowledgeBase {
    /// Relate `owner` to `value` through `field` and run inference.
    ///
    /// Collection fields relate root identities, single fields relate the
    /// objects as given. `rule` is `None` for direct writes.
    pub(crate) fn submit(
        &mut self,
        owner: &Symbol,
        value: &Symbol,
        field: FieldId,
        rule: Option<Provenance>,
    ) -> Result<()> {
        let descriptor = self.descriptors.get(field)?;
        let (name, property) = (descriptor.name(), descriptor.property());
        let (source, target) = if descriptor.shape().is_collection() {
            (owner.root(), value.root())
        } else {
            (owner.clone(), value.clone())
        };
        let inferred = rule.is_some();
        let source = self.graph.ensure_node(&source, inferred);
        let target = self.graph.ensure_node(&target, inferred);
        let relation = match rule {
            Some(rule) => Relation::derived(source, target, field, name, property, rule),
            None => Relation::direct(source, target, field, name, property),
        };
        if self.graph.add_edge(relation) {
            self.graph.enqueue(relation);
        }
        self.drain()
    }

    /// Drain the queue unless a pass is already running.
    fn drain(&mut self) -> Result<()> {
        if !self.graph.begin_drain() {
            return Ok(());
        }
        while let Some(relation) = self.graph.next_pending() {
            if let Err(err) = self.fire_rules(&relation) {
                let discarded = self.graph.abort_drain();
                warn!(discarded, error = %err, "inference pass aborted");
                return Err(err);
            }
        }
        self.graph.finish_drain();
        Ok(())
    }

    fn fire_rules(&mut self, relation: &Relation) -> Result<()> {
        // endpoints may have died since the relation was queued
        let (Some(source), Some(target)) = (
            self.graph.symbol(relation.source),
            self.graph.symbol(relation.target),
        ) else {
            return Ok(());
        };
        for rule in FIRING_ORDER {
            self.fire(rule, relation, &source, &target)
                .map_err(|err| self.rule_failed(rule, relation, &source, err))?;
        }
        Ok(())
    }

    fn fire(
        &mut self,
        rule: Provenance,
        relation: &Relation,
        source: &Symbol,
        target: &Symbol,
    ) -> Result<()> {
        let semantics = self.catalog.semantics(relation.property);
        match rule {
            Provenance::Equivalent => {
                if relation.derived_by(Provenance::Equivalent) {
                    return Ok(());
                }
                for equivalent in self.catalog.equivalents(relation.property) {
                    self.derive_located(source, target, equivalent, rule)?;
                }
                Ok(())
            }
            Provenance::Super => {
                for parent in self.catalog.direct_supers(relation.property).to_vec() {
                    self.derive_located(source, target, parent, rule)?;
                }
                Ok(())
            }
            Provenance::Inverse => self.infer_inverse(relation, source, target),
            Provenance::Transitive => {
                if !semantics.transitive
                    || semantics.symmetric
                    || relation.derived_by(Provenance::Equivalent)
                {
                    return Ok(());
                }
                self.infer_transitive(relation, source, target)
            }
            Provenance::Chain => self.infer_chains(relation),
            Provenance::Symmetry => {
                if !semantics.symmetric || relation.derived_by(Provenance::Symmetry) {
                    return Ok(());
                }
                self.derive_located(target, source, relation.property, rule)
            }
        }
    }

    // =========================================================================
    // RULES
    // =========================================================================

    fn infer_inverse(&mut self, relation: &Relation, source: &Symbol, target: &Symbol) -> Result<()> {
        if relation.derived_by(Provenance::Inverse) {
            return Ok(());
        }
        let Some(inverse) = self.catalog.inverse_of(relation.property) else {
            return Ok(());
        };
        if let Some((owner, field)) = self.locate(target, inverse) {
            return self.derive(&owner, source, field, Provenance::Inverse);
        }
        let field = self.diagram.field_name(relation.name).to_string();
        match self.config.unresolved_inverse {
            InversePolicy::Abort => Err(OntographError::UnresolvedInverse {
                inverse: self.catalog.name_of(inverse),
                field,
                owner_type: source.type_name().to_string(),
                target_type: target.type_name().to_string(),
            }),
            InversePolicy::Skip => {
                warn!(
                    inverse = %self.catalog.name_of(inverse),
                    field = %field,
                    target = %target,
                    "no field for inverse, skipped"
                );
                Ok(())
            }
        }
    }

    /// `(source, x)` for every `(target, x)`, and `(y, target)` for every
    /// `(y, source)`, following edges of the same kind or a sub-kind.
    fn infer_transitive(&mut self, relation: &Relation, source: &Symbol, target: &Symbol) -> Result<()> {
        let property = relation.property;
        let catalog = &self.catalog;
        let onward: Vec<NodeId> = self
            .graph
            .outgoing_where(relation.target, move |r| catalog.is_subproperty(r.property, property))
            .map(|r| r.target)
            .collect();
        let before: Vec<(NodeId, FieldId)> = self
            .graph
            .incoming_where(relation.source, move |r| catalog.is_subproperty(r.property, property))
            .map(|r| (r.source, r.field))
            .collect();

        for next in onward {
            if let Some(next) = self.graph.symbol(next) {
                self.derive(source, &next, relation.field, Provenance::Transitive)?;
            }
        }
        for (previous, field) in before {
            if let Some(previous) = self.graph.symbol(previous) {
                self.derive(&previous, target, field, Provenance::Transitive)?;
            }
        }
        Ok(())
    }

    fn infer_chains(&mut self, relation: &Relation) -> Result<()> {
        let participations: Vec<(PropertyId, Vec<PropertyId>, usize)> = self
            .catalog
            .chain_participations(relation.property)
            .into_iter()
            .map(|(axiom, index)| (axiom.target, axiom.links.clone(), index))
            .collect();

        for (goal, links, index) in participations {
            let (prefix, rest) = links.split_at(index);
            let suffix = rest.get(1..).unwrap_or_default();
            let starts = self.walk_backward(relation.source, prefix);
            let ends = self.walk_forward(relation.target, suffix);
            for start in &starts {
                let Some(start) = self.graph.symbol(*start) else {
                    continue;
                };
                for end in &ends {
                    if let Some(end) = self.graph.symbol(*end) {
                        self.derive_located(&start, &end, goal, Provenance::Chain)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Nodes reached from `node` by following `links` in reverse, last link first.
    fn walk_backward(&self, node: NodeId, links: &[PropertyId]) -> BTreeSet<NodeId> {
        let Some((last, rest)) = links.split_last() else {
            return BTreeSet::from([node]);
        };
        self.graph
            .incoming(node)
            .filter(|r| self.catalog.is_subproperty(r.property, *last))
            .flat_map(|r| self.walk_backward(r.source, rest))
            .collect()
    }

    /// Nodes reached from `node` by following `links` head to tail.
    fn walk_forward(&self, node: NodeId, links: &[PropertyId]) -> BTreeSet<NodeId> {
        let Some((first, rest)) = links.split_first() else {
            return BTreeSet::from([node]);
        };
        self.graph
            .outgoing(node)
            .filter(|r| self.catalog.is_subproperty(r.property, *first))
            .flat_map(|r| self.walk_forward(r.target, rest))
            .collect()
    }

    // =========================================================================
    // DERIVATION
    // =========================================================================

    /// The object and field that carry `property` for `symbol`.
    ///
    /// Looks at the symbol's own class, then each role-taker in its chain,
    /// then each registered role wrapping it.
    fn locate(&self, symbol: &Symbol, property: PropertyId) -> Option<(Symbol, FieldId)> {
        let mut candidates = vec![symbol.clone()];
        candidates.extend(symbol.role_taker_chain());
        candidates.extend(self.roles.roles_of(symbol));
        if symbol.is_role() {
            candidates.extend(self.roles.roles_of(&symbol.root()));
        }
        candidates.into_iter().find_map(|candidate| {
            let field = self
                .descriptors
                .for_property(&self.diagram, candidate.class(), property)?;
            Some((candidate, field))
        })
    }

    fn derive_located(
        &mut self,
        owner: &Symbol,
        value: &Symbol,
        property: PropertyId,
        rule: Provenance,
    ) -> Result<()> {
        match self.locate(owner, property) {
            Some((owner, field)) => self.derive(&owner, value, field, rule),
            None => {
                debug!(
                    rule = %rule,
                    property = %self.catalog.name_of(property),
                    owner = %owner,
                    "no field carries the derived relation, skipped"
                );
                Ok(())
            }
        }
    }

    fn derive(&mut self, owner: &Symbol, value: &Symbol, field: FieldId, rule: Provenance) -> Result<()> {
        let property = self.descriptors.get(field)?.property();
        if self.config.suppress_irreflexive_self_loops
            && owner.root_id() == value.root_id()
            && self.catalog.semantics(property).irreflexive
        {
            debug!(rule = %rule, owner = %owner, "irreflexive self-loop suppressed");
            return Ok(());
        }
        if !self.update_value(owner, field, value, true)? {
            return Ok(());
        }
        debug!(
            rule = %rule,
            field = %self.descriptors.get(field)?.field_name(),
            source = %owner,
            target = %value,
            "relation synthesized"
        );
        self.submit(owner, value, field, Some(rule))
    }

    /// Attach rule context to an error, unless it already carries its own.
    fn rule_failed(
        &self,
        rule: Provenance,
        relation: &Relation,
        source: &Symbol,
        err: OntographError,
    ) -> OntographError {
        match err {
            OntographError::UnresolvedInverse { .. } | OntographError::InferenceFailed { .. } => err,
            other => OntographError::InferenceFailed {
                rule,
                field: self.diagram.field_name(relation.name).to_string(),
                owner_type: source.type_name().to_string(),
                source: Box::new(other),
            },
        }
    }
}
