//! # Innate Primitives
//!
//! Fixed names and constants shared across the knowledge base.
//!
//! These values are compiled in and immutable at runtime.

/// Name of the implicit root class every declared class inherits from.
///
/// A class declared without bases gets this class as its only base, so every
/// method-resolution order ends here.
pub const ROOT_CLASS_NAME: &str = "Symbol";

/// Maximum number of links in a single chain axiom.
///
/// Chain walks recurse once per link; this keeps the walk depth bounded.
pub const MAX_CHAIN_LENGTH: usize = 16;

// =============================================================================
// DIAGNOSTICS RENDERING
// =============================================================================

/// Graphviz layout direction for DOT rendering.
pub const DOT_RANK_DIR: &str = "LR";

/// Edge color for relations written directly by the application.
pub const DOT_DIRECT_COLOR: &str = "black";

/// Edge color for relations synthesized by the inference engine.
pub const DOT_INFERRED_COLOR: &str = "red";
