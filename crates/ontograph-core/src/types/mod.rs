//! # Core Type Definitions
//!
//! This module contains the plain data types shared by every other module:
//! - Identifiers (`SymbolId`, `NodeId`, `ClassId`, `PropertyId`, `FieldId`, `NameId`)
//! - Plain attribute values (`Value`)
//! - Field shapes and container kinds (`FieldShape`, `ContainerKind`)
//! - Inference provenance (`Provenance`)
//! - Error types (`OntographError`)
//!
//! ## Determinism Guarantees
//!
//! All identifiers are integers that implement `Ord`, so every index in the
//! crate can be a `BTreeMap`/`BTreeSet` and iteration order never depends on
//! hashing.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Process-unique identity of one application object.
///
/// Two handles to the same object share a `SymbolId`; a role and the object it
/// wraps have different ids (see `Symbol::root_id` for the collapsed identity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u64);

/// Stable index of a node in the symbol graph.
///
/// Indices are never reused within one graph, even after the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Index of a declared class in a `ClassDiagram`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Index of a declared property kind in a `PropertyCatalog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

/// Index of a property descriptor (a property kind bound to one field of one class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(pub u32);

/// Interned field name.
///
/// Relation identity uses the field *name*, so two descriptors declaring a
/// field with the same name on different classes produce the same edge key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameId(pub u32);

// =============================================================================
// VALUES
// =============================================================================

/// A plain data attribute stored directly on a symbol.
///
/// Relation-valued fields never live here; they go through property
/// descriptors so that writes trigger inference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    /// Create a text value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Borrow the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

// =============================================================================
// FIELD SHAPES
// =============================================================================

/// Runtime container type of a collection value handed to a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Set,
    List,
    Deque,
    Tuple,
}

impl ContainerKind {
    /// Lowercase name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::List => "list",
            Self::Deque => "deque",
            Self::Tuple => "tuple",
        }
    }
}

/// Declared shape of a relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldShape {
    /// Holds at most one symbol.
    Single,
    /// Holds many symbols; the kind is the container used when the field is
    /// first populated by inference rather than by an explicit assignment.
    Collection(ContainerKind),
}

impl FieldShape {
    /// Whether the field holds a collection.
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::Collection(_))
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// The inference rule that synthesized a relation.
///
/// Variants are listed in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Provenance {
    Equivalent,
    Super,
    Inverse,
    Transitive,
    Chain,
    Symmetry,
}

impl Provenance {
    /// Uppercase tag used in logs and exports.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Equivalent => "EQUIVALENT",
            Self::Super => "SUPER",
            Self::Inverse => "INVERSE",
            Self::Transitive => "TRANSITIVE",
            Self::Chain => "CHAIN",
            Self::Symmetry => "SYMMETRY",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the knowledge base.
///
/// - No silent failures
/// - Every variant names the field and owner type (or class/property) involved
/// - The core never panics; all errors are recoverable values
#[derive(Debug, Error)]
pub enum OntographError {
    /// A property kind was attached twice to the same domain class.
    #[error("property `{property}` is already attached to domain `{domain}`")]
    DuplicateDomain { property: String, domain: String },

    /// A collection field was assigned a container with no monitored counterpart.
    #[error("field `{field}` of `{owner_type}` cannot monitor a `{container}` container")]
    UnsupportedContainer {
        field: String,
        owner_type: String,
        container: String,
    },

    /// Attribute lookup exhausted the whole role-taker chain.
    #[error("`{owner_type}` has no attribute `{attribute}` along its role-taker chain")]
    MissingAttribute {
        attribute: String,
        owner_type: String,
    },

    /// A declared inverse has no field on the target's type or its roles.
    #[error(
        "no field for inverse `{inverse}` of `{owner_type}.{field}` found on `{target_type}`"
    )]
    UnresolvedInverse {
        inverse: String,
        field: String,
        owner_type: String,
        target_type: String,
    },

    /// A rule failed while firing.
    #[error("{rule} inference on `{owner_type}.{field}` failed: {source}")]
    InferenceFailed {
        rule: Provenance,
        field: String,
        owner_type: String,
        #[source]
        source: Box<OntographError>,
    },

    /// The class is not declared.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// The property kind is not declared.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// No field with that name or id exists on the owner type.
    #[error("`{owner_type}` has no relation field `{field}`")]
    UnknownField { field: String, owner_type: String },

    /// A class with the same name is already declared.
    #[error("class `{0}` is already declared")]
    DuplicateClass(String),

    /// A property kind with the same name is already declared.
    #[error("property `{0}` is already declared")]
    DuplicateProperty(String),

    /// A field with the same name is already declared or attached on the class.
    #[error("field `{field}` is already declared on `{owner_type}`")]
    DuplicateField { field: String, owner_type: String },

    /// The bases of a class admit no consistent method-resolution order.
    #[error("cannot linearize the bases of `{0}`")]
    InconsistentHierarchy(String),

    /// A property kind combines semantics that exclude each other.
    #[error("property `{property}` cannot be both {first} and {second}")]
    ConflictingSemantics {
        property: String,
        first: &'static str,
        second: &'static str,
    },

    /// A chain axiom has no links or too many.
    #[error("invalid chain axiom for `{target}`: {reason}")]
    InvalidChainAxiom { target: String, reason: String },

    /// A role was requested for a class that is not a role class.
    #[error("`{0}` is not a role class")]
    NotARoleClass(String),

    /// The object offered as role-taker does not have the role's taker type.
    #[error("role `{role}` takes `{expected}`, got `{found}`")]
    RoleTakerMismatch {
        role: String,
        expected: String,
        found: String,
    },

    /// A single value was given to a collection field or the other way round.
    #[error("field `{field}` of `{owner_type}` expects {expected}")]
    ShapeMismatch {
        field: String,
        owner_type: String,
        expected: &'static str,
    },

    /// The monitored container does not support the requested operation.
    #[error("field `{field}` of `{owner_type}` does not support `{operation}`")]
    UnsupportedOperation {
        field: String,
        owner_type: String,
        operation: &'static str,
    },

    /// Positional access past the end of a monitored list.
    #[error("index {index} out of bounds for `{owner_type}.{field}` (len {len})")]
    IndexOutOfBounds {
        field: String,
        owner_type: String,
        index: usize,
        len: usize,
    },

    /// Configuration text could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A diagnostics snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OntographError>;

// =============================================================================
// TESTS
// =============================================================================
