//! # Query Module
//!
//! Structured, read-only relation queries.
//!
//! - One node, one direction, one edge filter
//! - Property filters are sub-property aware unless marked exact
//! - Results come back in relation-key order, so they are deterministic

use crate::graph::SymbolGraph;
use crate::property::PropertyCatalog;
use crate::relation::Relation;
use crate::types::{NameId, NodeId, PropertyId, Provenance};

/// Which side of the node to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Edge filters supported by the query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFilter {
    /// Every edge.
    Any,

    /// Edges through a field with this name.
    FieldName(NameId),

    /// Edges whose property kind is this kind or one of its sub-kinds.
    Property(PropertyId),

    /// Edges whose property kind is exactly this kind.
    ExactProperty(PropertyId),

    /// Edges synthesized by the inference engine.
    InferredOnly,

    /// Edges written directly by the application.
    DirectOnly,

    /// Edges synthesized by one specific rule.
    Provenance(Provenance),
}

impl EdgeFilter {
    /// Whether `relation` passes this filter.
    #[must_use]
    pub fn matches(&self, relation: &Relation, catalog: &PropertyCatalog) -> bool {
        match *self {
            Self::Any => true,
            Self::FieldName(name) => relation.name == name,
            Self::Property(property) => catalog.is_subproperty(relation.property, property),
            Self::ExactProperty(property) => relation.property == property,
            Self::InferredOnly => relation.inferred,
            Self::DirectOnly => !relation.inferred,
            Self::Provenance(rule) => relation.derived_by(rule),
        }
    }
}

/// A structured relation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationQuery {
    /// The node whose edges are inspected.
    pub node: NodeId,
    /// Outgoing or incoming edges.
    pub direction: Direction,
    /// Edge filter.
    pub filter: EdgeFilter,
}

impl RelationQuery {
    /// Create a query with no filter.
    #[must_use]
    pub fn new(node: NodeId, direction: Direction) -> Self {
        Self {
            node,
            direction,
            filter: EdgeFilter::Any,
        }
    }

    /// Outgoing helper.
    #[must_use]
    pub fn outgoing(node: NodeId) -> Self {
        Self::new(node, Direction::Outgoing)
    }

    /// Incoming helper.
    #[must_use]
    pub fn incoming(node: NodeId) -> Self {
        Self::new(node, Direction::Incoming)
    }

    /// Replace the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: EdgeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Execute against a graph. Never mutates it.
    #[must_use]
    pub fn run(&self, graph: &SymbolGraph, catalog: &PropertyCatalog) -> Vec<Relation> {
        let filter = self.filter;
        let keep = move |r: &Relation| filter.matches(r, catalog);
        match self.direction {
            Direction::Outgoing => graph.outgoing_where(self.node, keep).copied().collect(),
            Direction::Incoming => graph.incoming_where(self.node, keep).copied().collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
