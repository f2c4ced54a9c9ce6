//! # ontograph-core
//!
//! An in-process knowledge graph with forward-chaining relation inference.
//!
//! Application objects (`Symbol`s) are related through typed fields. Every
//! write is turned into a relation, admitted to the symbol graph, and run
//! through a fixed rule pipeline (equivalence, super-property, inverse,
//! transitive closure, chain axioms, symmetry) until no new relation appears.
//!
//! ## Building blocks
//!
//! - `ClassDiagram`: classes, bases, C3 MRO, relation fields, role classes
//! - `PropertyCatalog`: property kinds, semantics, inverses, equivalences, chains
//! - `DescriptorTable`: binds a property kind to a field and stores its values
//! - `SymbolGraph`: nodes, relations, indices, and the inference queue
//! - `KnowledgeBase`: owns all of the above and exposes the write/read paths
//!
//! ## Constraints
//!
//! - Single writer: a `KnowledgeBase` is not `Sync`; serialize all writes
//! - Non-owning: the graph only holds weak references; call `sweep()` to
//!   drop nodes of objects the application has released
//! - Deterministic: `BTreeMap`/`BTreeSet` everywhere, no floats, no randomness
//! - No panics: every failure is an `OntographError`

// =============================================================================
// MODULES
// =============================================================================

pub mod class_diagram;
pub mod config;
pub mod export;
pub mod graph;
pub mod inference;
pub mod knowledge;
pub mod loader;
pub mod primitives;
pub mod property;
pub mod query;
pub mod relation;
pub mod role;
pub mod symbol;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    ClassId, ContainerKind, FieldId, FieldShape, NameId, NodeId, OntographError, PropertyId,
    Provenance, Result, SymbolId, Value,
};

// =============================================================================
// RE-EXPORTS: Declarations
// =============================================================================

pub use class_diagram::{ClassDiagram, ClassInfo, FieldDecl};
pub use config::{InversePolicy, KnowledgeBaseConfig};
pub use property::descriptor::{DescriptorTable, PropertyDescriptor};
pub use property::monitored::{ContainerRegistry, MonitoredCollection, MonitoredKind};
pub use property::{ChainAxiom, PropertyCatalog, PropertyKind, PropertySpec, Semantics};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use export::{CanonicalEdge, CanonicalGraph, CanonicalNode};
pub use graph::{GraphSweep, InferenceState, SymbolGraph, WrappedInstance};
pub use knowledge::{CollectionHandle, FieldValue, KnowledgeBase, SweepReport};
pub use loader::{AxiomCheck, BulkLoader, LoadReport, Triple};
pub use query::{Direction, EdgeFilter, RelationQuery};
pub use relation::{Relation, RelationKey};
pub use role::RoleRegistry;
pub use symbol::{Symbol, WeakSymbol};
