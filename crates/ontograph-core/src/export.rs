//! # Diagnostics Export
//!
//! Deterministic, read-only snapshots of the knowledge graph.
//!
//! - `CanonicalGraph`: nodes and edges sorted by index, with names resolved
//! - JSON rendering through `serde_json`
//! - A deterministic checksum for quick equality checks
//! - A label-level fact set that ignores node indices, for comparing graphs
//!   built in different orders
//! - Graphviz DOT rendering, inferred edges drawn red
//!
//! Dead nodes (and edges touching them) are left out of every snapshot.

use crate::knowledge::KnowledgeBase;
use crate::primitives::{DOT_DIRECT_COLOR, DOT_INFERRED_COLOR, DOT_RANK_DIR};
use crate::types::{OntographError, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

// =============================================================================
// CANONICAL NODE & EDGE (Sorted, Deterministic)
// =============================================================================

/// A node in canonical format. Sorted by index.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalNode {
    /// The node index (sort key).
    pub index: u64,
    /// Concrete class name.
    pub class: String,
    pub label: String,
    /// Whether the inference engine registered the node.
    pub inferred: bool,
}

/// An edge in canonical format. Sorted by (source, target, field).
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalEdge {
    pub source: u64,
    pub target: u64,
    /// Field name.
    pub field: String,
    /// Property kind name.
    pub property: String,
    pub inferred: bool,
    /// Tag of the rule that synthesized the edge.
    pub provenance: Option<String>,
}

// =============================================================================
// CANONICAL GRAPH
// =============================================================================

/// A sorted snapshot of the graph.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CanonicalGraph {
    /// Nodes sorted by index.
    pub nodes: Vec<CanonicalNode>,
    /// Edges sorted by (source, target, field).
    pub edges: Vec<CanonicalEdge>,
}

impl CanonicalGraph {
    /// Snapshot the live part of a knowledge base.
    #[must_use]
    pub fn from_knowledge_base(kb: &KnowledgeBase) -> Self {
        let graph = kb.graph();
        let mut nodes: Vec<CanonicalNode> = graph
            .nodes()
            .filter_map(|node| {
                let symbol = node.symbol()?;
                Some(CanonicalNode {
                    index: node.index().0,
                    class: kb.classes().name_of(node.instance_type()),
                    label: symbol.label().to_string(),
                    inferred: node.is_inferred(),
                })
            })
            .collect();
        nodes.sort();

        let mut edges: Vec<CanonicalEdge> = graph
            .relations()
            .filter(|r| graph.contains_node(r.source) && graph.contains_node(r.target))
            .map(|r| CanonicalEdge {
                source: r.source.0,
                target: r.target.0,
                field: kb.classes().field_name(r.name).to_string(),
                property: kb.properties().name_of(r.property),
                inferred: r.inferred,
                provenance: r.provenance.map(|p| p.tag().to_string()),
            })
            .collect();
        edges.sort();

        Self { nodes, edges }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| OntographError::Serialization(e.to_string()))
    }

    /// Compute a deterministic checksum of the snapshot.
    ///
    /// XOR/rotate mixing; no floating point, no randomness. Not a
    /// cryptographic hash.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0;

        for node in &self.nodes {
            hash ^= node.index.rotate_left(13);
            hash ^= mix_text(&node.class).rotate_left(7);
            hash ^= mix_text(&node.label).rotate_left(3);
            hash ^= u64::from(node.inferred).rotate_left(1);
        }

        for edge in &self.edges {
            hash ^= edge.source.rotate_left(17);
            hash ^= edge.target.rotate_left(11);
            hash ^= mix_text(&edge.field).rotate_left(5);
            hash ^= mix_text(&edge.property).rotate_left(19);
            if let Some(tag) = &edge.provenance {
                hash ^= mix_text(tag).rotate_left(23);
            }
        }

        hash ^= (self.nodes.len() as u64).rotate_left(29);
        hash ^= (self.edges.len() as u64).rotate_left(31);
        hash
    }

    /// `(source label, field, target label)` for every edge.
    #[must_use]
    pub fn facts(&self) -> BTreeSet<(String, String, String)> {
        let label = |index: u64| {
            self.nodes
                .binary_search_by_key(&index, |n| n.index)
                .ok()
                .and_then(|pos| self.nodes.get(pos))
                .map(|n| n.label.clone())
                .unwrap_or_default()
        };
        self.edges
            .iter()
            .map(|e| (label(e.source), e.field.clone(), label(e.target)))
            .collect()
    }

    /// Render as a Graphviz digraph.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph knowledge {{");
        let _ = writeln!(out, "    rankdir={DOT_RANK_DIR};");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "    n{} [label=\"{}\\n{}\"];",
                node.index,
                escape(&node.label),
                escape(&node.class)
            );
        }
        for edge in &self.edges {
            let color = if edge.inferred {
                DOT_INFERRED_COLOR
            } else {
                DOT_DIRECT_COLOR
            };
            let _ = writeln!(
                out,
                "    n{} -> n{} [label=\"{}\", color={color}];",
                edge.source,
                edge.target,
                escape(&edge.field)
            );
        }
        out.push_str("}\n");
        out
    }
}

/// Order-sensitive fold of a string into a u64.
fn mix_text(text: &str) -> u64 {
    text.bytes()
        .fold(0u64, |hash, byte| hash.rotate_left(5) ^ u64::from(byte))
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::FieldValue;
    use crate::property::{PropertySpec, Semantics};
    use crate::symbol::Symbol;
    use crate::types::{ContainerKind, FieldShape};

    fn friendly_graph() -> (KnowledgeBase, Vec<Symbol>) {
        let mut kb = KnowledgeBase::new();
        let diagram = kb.classes_mut();
        let person = diagram.declare_class("Person", &[]).expect("Person");
        diagram
            .declare_field(person, "knows", person, FieldShape::Collection(ContainerKind::Set))
            .expect("knows");
        let knows = kb
            .properties_mut()
            .declare("Knows", PropertySpec::new().with_semantics(Semantics::none().symmetric()))
            .expect("Knows");
        let field = kb.attach(knows, person, "knows").expect("attach");
        let ann = kb.create(person, "ann").expect("ann");
        let bob = kb.create(person, "bob").expect("bob");
        kb.set(&ann, field, FieldValue::set([bob.clone()])).expect("set");
        (kb, vec![ann, bob])
    }

    #[test]
    fn snapshot_is_sorted_and_complete() {
        let (kb, _symbols) = friendly_graph();
        let canonical = CanonicalGraph::from_knowledge_base(&kb);
        assert_eq!(canonical.nodes.len(), 2);
        assert_eq!(canonical.edges.len(), 2);
        assert!(canonical.nodes.windows(2).all(|w| w[0] <= w[1]));
        assert!(canonical.edges.windows(2).all(|w| w[0] <= w[1]));
        let inferred: Vec<_> = canonical.edges.iter().filter(|e| e.inferred).collect();
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].provenance.as_deref(), Some("SYMMETRY"));
    }

    #[test]
    fn checksum_is_deterministic() {
        let (kb, _symbols) = friendly_graph();
        let first = CanonicalGraph::from_knowledge_base(&kb);
        let second = CanonicalGraph::from_knowledge_base(&kb);
        assert_eq!(first.checksum(), second.checksum());

        let (other, _other_symbols) = friendly_graph();
        let rebuilt = CanonicalGraph::from_knowledge_base(&other);
        assert_eq!(first.facts(), rebuilt.facts());
    }

    #[test]
    fn facts_use_labels() {
        let (kb, _symbols) = friendly_graph();
        let facts = CanonicalGraph::from_knowledge_base(&kb).facts();
        let expected: BTreeSet<(String, String, String)> = [
            ("ann".to_string(), "knows".to_string(), "bob".to_string()),
            ("bob".to_string(), "knows".to_string(), "ann".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(facts, expected);
    }

    #[test]
    fn dead_nodes_are_left_out() {
        let (kb, mut symbols) = friendly_graph();
        symbols.pop();
        let canonical = CanonicalGraph::from_knowledge_base(&kb);
        assert_eq!(canonical.nodes.len(), 1);
        assert!(canonical.edges.is_empty());
    }

    #[test]
    fn json_and_dot_rendering() {
        let (kb, _symbols) = friendly_graph();
        let canonical = CanonicalGraph::from_knowledge_base(&kb);
        let json = canonical.to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(2));

        let dot = canonical.to_dot();
        assert!(dot.starts_with("digraph knowledge {"));
        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("color=red"));
        assert!(dot.contains("color=black"));
    }
}
