//! # Symbol Graph
//!
//! The node/edge store of the knowledge base.
//!
//! - One node per live object identity, created lazily, with a stable index
//! - Edges are `Relation`s, unique by `(source, target, field name)`
//! - Indices by node class, by field name, by property kind and by endpoint
//! - The inference work-queue and its two-state drain flag live here
//!
//! Nodes hold weak references only. A node whose object was dropped is treated
//! as absent by every lookup and is removed by `sweep()`.
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::relation::{Relation, RelationKey};
use crate::symbol::{Symbol, WeakSymbol};
use crate::types::{ClassId, NameId, NodeId, PropertyId, SymbolId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{info, trace};

// =============================================================================
// NODES
// =============================================================================

/// A graph node wrapping one application object.
#[derive(Debug, Clone)]
pub struct WrappedInstance {
    reference: WeakSymbol,
    index: NodeId,
    instance_type: ClassId,
    inferred: bool,
}

impl WrappedInstance {
    /// Stable node index.
    #[must_use]
    pub fn index(&self) -> NodeId {
        self.index
    }

    /// The wrapped object, if still alive.
    #[must_use]
    pub fn symbol(&self) -> Option<Symbol> {
        self.reference.upgrade()
    }

    /// Identity of the wrapped object.
    #[must_use]
    pub fn symbol_id(&self) -> SymbolId {
        self.reference.id()
    }

    /// Concrete class of the wrapped object.
    #[must_use]
    pub fn instance_type(&self) -> ClassId {
        self.instance_type
    }

    /// Whether the node was first registered by the inference engine.
    #[must_use]
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.reference.is_alive()
    }
}

/// Whether an inference pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InferenceState {
    #[default]
    Idle,
    Draining,
}

/// Counts reported by `SymbolGraph::sweep`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphSweep {
    pub nodes_removed: usize,
    pub relations_removed: usize,
}

// =============================================================================
// GRAPH
// =============================================================================

/// Directed multigraph of symbols and relations.
#[derive(Debug, Default)]
pub struct SymbolGraph {
    nodes: BTreeMap<NodeId, WrappedInstance>,
    by_symbol: BTreeMap<SymbolId, NodeId>,
    by_class: BTreeMap<ClassId, BTreeSet<NodeId>>,
    relations: BTreeMap<RelationKey, Relation>,
    outgoing: BTreeMap<NodeId, BTreeSet<RelationKey>>,
    incoming: BTreeMap<NodeId, BTreeSet<RelationKey>>,
    by_name: BTreeMap<NameId, BTreeSet<RelationKey>>,
    by_property: BTreeMap<PropertyId, BTreeSet<RelationKey>>,
    next_index: u64,
    pending: VecDeque<Relation>,
    state: InferenceState,
}

impl SymbolGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // NODES
    // =========================================================================

    /// Register `symbol` if needed and return its node. Idempotent per object.
    pub fn ensure_node(&mut self, symbol: &Symbol, inferred: bool) -> NodeId {
        if let Some(index) = self.by_symbol.get(&symbol.id()) {
            return *index;
        }
        let index = NodeId(self.next_index);
        self.next_index = self.next_index.saturating_add(1);
        self.nodes.insert(
            index,
            WrappedInstance {
                reference: symbol.downgrade(),
                index,
                instance_type: symbol.class(),
                inferred,
            },
        );
        self.by_symbol.insert(symbol.id(), index);
        self.by_class.entry(symbol.class()).or_default().insert(index);
        trace!(node = index.0, symbol = %symbol, "node registered");
        index
    }

    /// Register an externally constructed object.
    pub fn add_instance(&mut self, symbol: &Symbol) -> NodeId {
        self.ensure_node(symbol, false)
    }

    /// The node of `symbol`, if registered.
    #[must_use]
    pub fn node_of(&self, symbol: &Symbol) -> Option<NodeId> {
        self.by_symbol.get(&symbol.id()).copied()
    }

    /// A node by index. Dead nodes are reported as absent.
    #[must_use]
    pub fn node(&self, index: NodeId) -> Option<&WrappedInstance> {
        self.nodes.get(&index).filter(|n| n.is_alive())
    }

    /// The live object behind a node.
    #[must_use]
    pub fn symbol(&self, index: NodeId) -> Option<Symbol> {
        self.nodes.get(&index)?.symbol()
    }

    #[must_use]
    pub fn contains_node(&self, index: NodeId) -> bool {
        self.node(index).is_some()
    }

    /// All nodes (live or awaiting sweep) in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &WrappedInstance> {
        self.nodes.values()
    }

    /// Number of nodes, including dead ones not yet swept.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Live nodes whose concrete class is exactly `class`.
    #[must_use]
    pub fn nodes_of_class(&self, class: ClassId) -> Vec<NodeId> {
        self.by_class
            .get(&class)
            .map(|set| set.iter().copied().filter(|n| self.contains_node(*n)).collect())
            .unwrap_or_default()
    }

    /// Remove a node and every relation touching it.
    pub fn remove_node(&mut self, index: NodeId) -> bool {
        let Some(node) = self.nodes.remove(&index) else {
            return false;
        };
        self.by_symbol.remove(&node.symbol_id());
        if let Some(set) = self.by_class.get_mut(&node.instance_type) {
            set.remove(&index);
        }
        let mut incident: BTreeSet<RelationKey> = BTreeSet::new();
        incident.extend(self.outgoing.remove(&index).unwrap_or_default());
        incident.extend(self.incoming.remove(&index).unwrap_or_default());
        for key in incident {
            self.unlink(&key);
        }
        true
    }

    /// Drop every node whose object is gone, with its relations.
    pub fn sweep(&mut self) -> GraphSweep {
        let dead: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| !n.is_alive())
            .map(|n| n.index)
            .collect();
        let relations_before = self.relations.len();
        for index in &dead {
            self.remove_node(*index);
        }
        let report = GraphSweep {
            nodes_removed: dead.len(),
            relations_removed: relations_before.saturating_sub(self.relations.len()),
        };
        if report.nodes_removed > 0 {
            info!(
                nodes = report.nodes_removed,
                relations = report.relations_removed,
                "swept dead nodes"
            );
        }
        report
    }

    /// Remove all nodes, relations and pending work. Indices keep increasing.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_symbol.clear();
        self.by_class.clear();
        self.relations.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.by_name.clear();
        self.by_property.clear();
        self.pending.clear();
        self.state = InferenceState::Idle;
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// Admit a relation. Returns `false` (and changes nothing) if an edge
    /// with the same identity already exists.
    pub fn add_edge(&mut self, relation: Relation) -> bool {
        let key = relation.key();
        if self.relations.contains_key(&key) {
            return false;
        }
        self.relations.insert(key, relation);
        self.outgoing.entry(key.source).or_default().insert(key);
        self.incoming.entry(key.target).or_default().insert(key);
        self.by_name.entry(key.name).or_default().insert(key);
        self.by_property
            .entry(relation.property)
            .or_default()
            .insert(key);
        trace!(
            source = key.source.0,
            target = key.target.0,
            name = key.name.0,
            inferred = relation.inferred,
            "edge admitted"
        );
        true
    }

    fn unlink(&mut self, key: &RelationKey) {
        let Some(relation) = self.relations.remove(key) else {
            return;
        };
        if let Some(set) = self.outgoing.get_mut(&key.source) {
            set.remove(key);
        }
        if let Some(set) = self.incoming.get_mut(&key.target) {
            set.remove(key);
        }
        if let Some(set) = self.by_name.get_mut(&key.name) {
            set.remove(key);
        }
        if let Some(set) = self.by_property.get_mut(&relation.property) {
            set.remove(key);
        }
    }

    /// A relation by identity.
    #[must_use]
    pub fn relation(&self, key: &RelationKey) -> Option<&Relation> {
        self.relations.get(key)
    }

    #[must_use]
    pub fn has_relation(&self, key: &RelationKey) -> bool {
        self.relations.contains_key(key)
    }

    /// All relations in key order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    fn resolve<'a>(
        &'a self,
        keys: Option<&'a BTreeSet<RelationKey>>,
    ) -> impl Iterator<Item = &'a Relation> + 'a {
        keys.into_iter()
            .flatten()
            .filter_map(|key| self.relations.get(key))
    }

    /// Relations leaving `node`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Relation> {
        self.resolve(self.outgoing.get(&node))
    }

    /// Relations entering `node`.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = &Relation> {
        self.resolve(self.incoming.get(&node))
    }

    /// Relations leaving `node` that satisfy `condition`.
    pub fn outgoing_where<'a, F>(&'a self, node: NodeId, condition: F) -> impl Iterator<Item = &'a Relation>
    where
        F: Fn(&Relation) -> bool + 'a,
    {
        self.outgoing(node).filter(move |r| condition(r))
    }

    /// Relations entering `node` that satisfy `condition`.
    pub fn incoming_where<'a, F>(&'a self, node: NodeId, condition: F) -> impl Iterator<Item = &'a Relation>
    where
        F: Fn(&Relation) -> bool + 'a,
    {
        self.incoming(node).filter(move |r| condition(r))
    }

    /// Relations leaving `node` through the field named `name`.
    pub fn outgoing_by_name(&self, node: NodeId, name: NameId) -> impl Iterator<Item = &Relation> {
        self.outgoing_where(node, move |r| r.name == name)
    }

    /// Relations entering `node` through the field named `name`.
    pub fn incoming_by_name(&self, node: NodeId, name: NameId) -> impl Iterator<Item = &Relation> {
        self.incoming_where(node, move |r| r.name == name)
    }

    /// Every relation through a field named `name`.
    pub fn relations_by_name(&self, name: NameId) -> impl Iterator<Item = &Relation> {
        self.resolve(self.by_name.get(&name))
    }

    /// Every relation whose field has exactly the property kind `property`.
    pub fn relations_by_property(&self, property: PropertyId) -> impl Iterator<Item = &Relation> {
        self.resolve(self.by_property.get(&property))
    }

    // =========================================================================
    // INFERENCE QUEUE
    // =========================================================================

    /// Current drain state.
    #[must_use]
    pub fn state(&self) -> InferenceState {
        self.state
    }

    /// Number of admitted relations whose rules have not fired yet.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn enqueue(&mut self, relation: Relation) {
        self.pending.push_back(relation);
    }

    /// Enter `Draining`. Returns `false` if a pass is already running.
    pub(crate) fn begin_drain(&mut self) -> bool {
        if self.state == InferenceState::Draining {
            return false;
        }
        self.state = InferenceState::Draining;
        true
    }

    pub(crate) fn next_pending(&mut self) -> Option<Relation> {
        self.pending.pop_front()
    }

    pub(crate) fn finish_drain(&mut self) {
        self.state = InferenceState::Idle;
    }

    /// Discard queued work and return to `Idle`. Returns the number discarded.
    pub(crate) fn abort_drain(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        self.state = InferenceState::Idle;
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldId, Provenance};

    fn symbol(label: &str) -> Symbol {
        Symbol::new(ClassId(1), "Person", label)
    }

    fn edge(a: NodeId, b: NodeId, name: u32) -> Relation {
        Relation::direct(a, b, FieldId(0), NameId(name), PropertyId(0))
    }

    #[test]
    fn ensure_node_is_idempotent_per_object() {
        let mut graph = SymbolGraph::new();
        let a = symbol("a");
        let first = graph.ensure_node(&a, false);
        let second = graph.add_instance(&a.clone());
        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);

        let role = Symbol::new_role(ClassId(2), "CEO", "r", &a);
        assert_ne!(graph.ensure_node(&role, true), first);
        assert_eq!(graph.nodes_of_class(ClassId(1)), vec![first]);
    }

    #[test]
    fn add_edge_rejects_same_identity() {
        let mut graph = SymbolGraph::new();
        let a = graph.add_instance(&symbol("a"));
        let b = graph.add_instance(&symbol("b"));
        assert!(graph.add_edge(edge(a, b, 0)));
        let again = Relation::derived(a, b, FieldId(3), NameId(0), PropertyId(1), Provenance::Super);
        assert!(!graph.add_edge(again));
        assert!(graph.add_edge(edge(a, b, 1)));
        assert_eq!(graph.relation_count(), 2);
        let kept = graph.relation(&edge(a, b, 0).key()).expect("kept");
        assert!(!kept.inferred);
    }

    #[test]
    fn queries_by_endpoint_and_name() {
        let mut graph = SymbolGraph::new();
        let (sa, sb, sc) = (symbol("a"), symbol("b"), symbol("c"));
        let a = graph.add_instance(&sa);
        let b = graph.add_instance(&sb);
        let c = graph.add_instance(&sc);
        graph.add_edge(edge(a, b, 0));
        graph.add_edge(edge(a, c, 1));
        graph.add_edge(edge(c, b, 0));

        assert_eq!(graph.outgoing(a).count(), 2);
        assert_eq!(graph.incoming(b).count(), 2);
        assert_eq!(graph.outgoing_by_name(a, NameId(1)).count(), 1);
        assert_eq!(graph.incoming_by_name(b, NameId(0)).count(), 2);
        assert_eq!(graph.relations_by_name(NameId(0)).count(), 2);
        assert_eq!(graph.relations_by_property(PropertyId(0)).count(), 3);
        assert_eq!(graph.outgoing_where(c, |r| r.target == b).count(), 1);
    }

    #[test]
    fn removing_a_node_removes_incident_edges() {
        let mut graph = SymbolGraph::new();
        let (sa, sb) = (symbol("a"), symbol("b"));
        let a = graph.add_instance(&sa);
        let b = graph.add_instance(&sb);
        graph.add_edge(edge(a, b, 0));
        graph.add_edge(edge(b, a, 0));
        assert!(graph.remove_node(b));
        assert!(!graph.remove_node(b));
        assert_eq!(graph.relation_count(), 0);
        assert_eq!(graph.outgoing(a).count(), 0);
        assert_eq!(graph.node_of(&sb), None);
    }

    #[test]
    fn sweep_drops_dead_nodes() {
        let mut graph = SymbolGraph::new();
        let keep = symbol("keep");
        let k = graph.add_instance(&keep);
        {
            let gone = symbol("gone");
            let g = graph.add_instance(&gone);
            graph.add_edge(edge(k, g, 0));
            assert!(graph.contains_node(g));
        }
        assert_eq!(graph.node_count(), 2);
        let report = graph.sweep();
        assert_eq!(report.nodes_removed, 1);
        assert_eq!(report.relations_removed, 1);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.symbol(k).is_some());
    }

    #[test]
    fn drain_flag_guards_reentrancy() {
        let mut graph = SymbolGraph::new();
        assert!(graph.begin_drain());
        assert!(!graph.begin_drain());
        graph.enqueue(edge(NodeId(0), NodeId(1), 0));
        assert_eq!(graph.abort_drain(), 1);
        assert_eq!(graph.state(), InferenceState::Idle);
        assert!(graph.next_pending().is_none());
        graph.finish_drain();
    }
}
