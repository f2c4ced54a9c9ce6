//! # Symbols
//!
//! Application-owned objects eligible to be graph nodes.
//!
//! A `Symbol` is a cheap, clonable handle. The knowledge base itself only ever
//! keeps `WeakSymbol`s, so dropping the last application handle frees the
//! object and the next `sweep()` removes its node.
//!
//! ## Roles
//!
//! A symbol created with a role-taker is a *role*: a facade over another
//! symbol (possibly itself a role). Roles:
//! - compare and hash by the identity at the end of the taker chain (the root)
//! - read attributes they lack from their taker, recursively
//! - write attributes through to the taker when the taker already has them

use crate::types::{ClassId, OntographError, Result, SymbolId, Value};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

fn next_symbol_id() -> SymbolId {
    SymbolId(NEXT_SYMBOL_ID.fetch_add(1, AtomicOrdering::Relaxed))
}

#[derive(Debug)]
struct SymbolData {
    id: SymbolId,
    root: SymbolId,
    class: ClassId,
    type_name: String,
    label: String,
    role_taker: Option<Symbol>,
    attributes: RefCell<BTreeMap<String, Value>>,
}

// =============================================================================
// SYMBOL
// =============================================================================

/// Strong handle to an application object.
#[derive(Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    /// Create a plain (non-role) symbol.
    ///
    /// Class validation happens in `KnowledgeBase::create`; this constructor
    /// only records what it is given.
    pub(crate) fn new(class: ClassId, type_name: &str, label: impl Into<String>) -> Self {
        let id = next_symbol_id();
        Self(Rc::new(SymbolData {
            id,
            root: id,
            class,
            type_name: type_name.to_string(),
            label: label.into(),
            role_taker: None,
            attributes: RefCell::new(BTreeMap::new()),
        }))
    }

    /// Create a role over `taker`.
    pub(crate) fn new_role(
        class: ClassId,
        type_name: &str,
        label: impl Into<String>,
        taker: &Symbol,
    ) -> Self {
        Self(Rc::new(SymbolData {
            id: next_symbol_id(),
            root: taker.root_id(),
            class,
            type_name: type_name.to_string(),
            label: label.into(),
            role_taker: Some(taker.clone()),
            attributes: RefCell::new(BTreeMap::new()),
        }))
    }

    /// Identity of this exact object.
    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.0.id
    }

    /// Identity of the object at the end of the role-taker chain.
    #[must_use]
    pub fn root_id(&self) -> SymbolId {
        self.0.root
    }

    /// The concrete class of this object.
    #[must_use]
    pub fn class(&self) -> ClassId {
        self.0.class
    }

    /// Name of the concrete class, kept for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Whether this object is a role.
    #[must_use]
    pub fn is_role(&self) -> bool {
        self.0.role_taker.is_some()
    }

    /// The object this role wraps.
    #[must_use]
    pub fn role_taker(&self) -> Option<&Symbol> {
        self.0.role_taker.as_ref()
    }

    /// The takers of this role, nearest first. Empty for plain objects.
    #[must_use]
    pub fn role_taker_chain(&self) -> Vec<Symbol> {
        let mut chain = Vec::new();
        let mut current = self.role_taker();
        while let Some(taker) = current {
            chain.push(taker.clone());
            current = taker.role_taker();
        }
        chain
    }

    /// The root persistent entity (this object when it is not a role).
    #[must_use]
    pub fn root(&self) -> Symbol {
        self.role_taker_chain()
            .pop()
            .unwrap_or_else(|| self.clone())
    }

    /// Whether both handles point at the very same object.
    ///
    /// Unlike `==`, a role and its taker are never the same object.
    #[must_use]
    pub fn is_same_object(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Create a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakSymbol {
        WeakSymbol {
            id: self.0.id,
            root: self.0.root,
            inner: Rc::downgrade(&self.0),
        }
    }

    // =========================================================================
    // ATTRIBUTES
    // =========================================================================

    /// Whether this object or any taker in its chain has the attribute.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.0.attributes.borrow().contains_key(name)
            || self.role_taker().is_some_and(|taker| taker.has_attr(name))
    }

    /// Read an attribute, falling back along the role-taker chain.
    pub fn get_attr(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.0.attributes.borrow().get(name) {
            return Ok(value.clone());
        }
        match self.role_taker() {
            Some(taker) => taker.get_attr(name).map_err(|_| self.missing(name)),
            None => Err(self.missing(name)),
        }
    }

    /// Write an attribute.
    ///
    /// The value is always stored locally. When the taker chain already has
    /// an attribute of that name, the taker is updated too.
    pub fn set_attr(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if let Some(taker) = self.role_taker().filter(|taker| taker.has_attr(name)) {
            taker.set_attr(name, value.clone());
        }
        self.0.attributes.borrow_mut().insert(name.to_string(), value);
    }

    /// Names of the attributes stored locally on this object.
    #[must_use]
    pub fn local_attr_names(&self) -> Vec<String> {
        self.0.attributes.borrow().keys().cloned().collect()
    }

    fn missing(&self, name: &str) -> OntographError {
        OntographError::MissingAttribute {
            attribute: name.to_string(),
            owner_type: self.type_name().to_string(),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.root_id() == other.root_id()
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root_id().hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.root_id().cmp(&other.root_id())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("id", &self.0.id)
            .field("root", &self.0.root)
            .field("type", &self.0.type_name)
            .field("label", &self.0.label)
            .finish()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.type_name, self.0.label)
    }
}

// =============================================================================
// WEAK SYMBOL
// =============================================================================

/// Non-owning handle to a symbol.
///
/// Keeps both identities so a dead reference can still be indexed and removed.
#[derive(Clone)]
pub struct WeakSymbol {
    id: SymbolId,
    root: SymbolId,
    inner: Weak<SymbolData>,
}

impl WeakSymbol {
    /// Identity of the referenced object.
    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Root identity of the referenced object.
    #[must_use]
    pub fn root_id(&self) -> SymbolId {
        self.root
    }

    /// Get a strong handle if the object is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Symbol> {
        self.inner.upgrade().map(Symbol)
    }

    /// Whether the referenced object is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSymbol")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
