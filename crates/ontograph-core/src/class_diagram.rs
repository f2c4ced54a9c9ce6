//! # Class Diagram
//!
//! Explicit registry of the classes symbols can be instances of.
//!
//! - Classes have ordered bases and a C3 method-resolution order (MRO)
//! - Every MRO ends at the implicit root class (`ROOT_CLASS_NAME`)
//! - Role classes record their role-taker class once, at declaration
//! - Relation fields are declared per class with a range class and a shape
//!
//! Field names are interned here; relation identity is keyed by `NameId`.
//! Role-aware type comparisons live in the `role` module.

use crate::primitives::ROOT_CLASS_NAME;
use crate::types::{ClassId, FieldShape, NameId, OntographError, Result};
use std::collections::BTreeMap;

/// A relation field declared on a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    /// Interned field name.
    pub name: NameId,
    /// Declared range (element class for collection fields).
    pub range: ClassId,
    /// Single value or collection.
    pub shape: FieldShape,
}

/// A declared class.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    id: ClassId,
    name: String,
    bases: Vec<ClassId>,
    direct_role_taker: Option<ClassId>,
    role_taker_type: Option<ClassId>,
    mro: Vec<ClassId>,
    fields: BTreeMap<NameId, FieldDecl>,
}

impl ClassInfo {
    /// Class id.
    #[must_use]
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct bases, in declaration order.
    #[must_use]
    pub fn bases(&self) -> &[ClassId] {
        &self.bases
    }

    /// Method-resolution order, starting with this class.
    #[must_use]
    pub fn mro(&self) -> &[ClassId] {
        &self.mro
    }

    /// The taker class this class declares directly, if it was declared as a role.
    #[must_use]
    pub fn direct_role_taker(&self) -> Option<ClassId> {
        self.direct_role_taker
    }

    /// The taker class of this role class, declared or inherited.
    #[must_use]
    pub fn role_taker_type(&self) -> Option<ClassId> {
        self.role_taker_type
    }

    /// Whether instances of this class are roles.
    #[must_use]
    pub fn is_role(&self) -> bool {
        self.role_taker_type.is_some()
    }

    /// Fields declared directly on this class.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.values()
    }
}

/// Registry of classes, their hierarchy and their relation fields.
#[derive(Debug, Clone)]
pub struct ClassDiagram {
    classes: Vec<ClassInfo>,
    by_name: BTreeMap<String, ClassId>,
    names: Vec<String>,
    name_ids: BTreeMap<String, NameId>,
}

impl Default for ClassDiagram {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassDiagram {
    /// Create a diagram holding only the root class.
    #[must_use]
    pub fn new() -> Self {
        let root = ClassId(0);
        let mut by_name = BTreeMap::new();
        by_name.insert(ROOT_CLASS_NAME.to_string(), root);
        Self {
            classes: vec![ClassInfo {
                id: root,
                name: ROOT_CLASS_NAME.to_string(),
                bases: Vec::new(),
                direct_role_taker: None,
                role_taker_type: None,
                mro: vec![root],
                fields: BTreeMap::new(),
            }],
            by_name,
            names: Vec::new(),
            name_ids: BTreeMap::new(),
        }
    }

    /// The implicit root class.
    #[must_use]
    pub fn root(&self) -> ClassId {
        ClassId(0)
    }

    /// Number of declared classes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false: the root class exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    // =========================================================================
    // DECLARATION
    // =========================================================================

    /// Declare a plain class. Empty `bases` means "inherits from the root".
    ///
    /// A class inheriting from a role class is itself a role class with the
    /// same taker type.
    pub fn declare_class(&mut self, name: &str, bases: &[ClassId]) -> Result<ClassId> {
        self.insert_class(name, bases, None)
    }

    /// Declare a role class whose instances wrap an instance of `taker`.
    pub fn declare_role(&mut self, name: &str, taker: ClassId, bases: &[ClassId]) -> Result<ClassId> {
        self.class(taker)?;
        self.insert_class(name, bases, Some(taker))
    }

    fn insert_class(
        &mut self,
        name: &str,
        bases: &[ClassId],
        direct_role_taker: Option<ClassId>,
    ) -> Result<ClassId> {
        if self.by_name.contains_key(name) {
            return Err(OntographError::DuplicateClass(name.to_string()));
        }
        let bases = if bases.is_empty() {
            vec![self.root()]
        } else {
            bases.to_vec()
        };
        for base in &bases {
            self.class(*base)?;
        }
        for (i, base) in bases.iter().enumerate() {
            if bases[..i].contains(base) {
                return Err(OntographError::InconsistentHierarchy(name.to_string()));
            }
        }

        let id = ClassId(self.classes.len() as u32);
        let mro = self.linearize(id, &bases, name)?;
        let role_taker_type = direct_role_taker.or_else(|| {
            mro.iter()
                .skip(1)
                .find_map(|c| self.classes.get(c.0 as usize)?.direct_role_taker)
        });

        self.classes.push(ClassInfo {
            id,
            name: name.to_string(),
            bases,
            direct_role_taker,
            role_taker_type,
            mro,
            fields: BTreeMap::new(),
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// C3 linearization of a class with the given bases.
    fn linearize(&self, id: ClassId, bases: &[ClassId], name: &str) -> Result<Vec<ClassId>> {
        let mut sequences: Vec<Vec<ClassId>> = Vec::with_capacity(bases.len() + 1);
        for base in bases {
            sequences.push(self.class(*base)?.mro.clone());
        }
        sequences.push(bases.to_vec());

        let mut out = vec![id];
        loop {
            sequences.retain(|s| !s.is_empty());
            if sequences.is_empty() {
                return Ok(out);
            }
            let head = sequences
                .iter()
                .map(|s| s[0])
                .find(|candidate| !sequences.iter().any(|s| s[1..].contains(candidate)))
                .ok_or_else(|| OntographError::InconsistentHierarchy(name.to_string()))?;
            out.push(head);
            for sequence in &mut sequences {
                if sequence[0] == head {
                    sequence.remove(0);
                }
            }
        }
    }

    /// Declare a relation field on `class`.
    pub fn declare_field(
        &mut self,
        class: ClassId,
        name: &str,
        range: ClassId,
        shape: FieldShape,
    ) -> Result<NameId> {
        self.class(range)?;
        let owner_type = self.class(class)?.name.clone();
        let name_id = self.intern(name);
        let info = self
            .classes
            .get_mut(class.0 as usize)
            .ok_or_else(|| OntographError::UnknownClass(format!("{class:?}")))?;
        if info.fields.contains_key(&name_id) {
            return Err(OntographError::DuplicateField {
                field: name.to_string(),
                owner_type,
            });
        }
        info.fields.insert(
            name_id,
            FieldDecl {
                name: name_id,
                range,
                shape,
            },
        );
        Ok(name_id)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Get a class by id.
    pub fn class(&self, id: ClassId) -> Result<&ClassInfo> {
        self.classes
            .get(id.0 as usize)
            .ok_or_else(|| OntographError::UnknownClass(format!("{id:?}")))
    }

    /// Find a class by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Name of a class, or a debug rendering of the id if it is unknown.
    #[must_use]
    pub fn name_of(&self, id: ClassId) -> String {
        self.classes
            .get(id.0 as usize)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("{id:?}"))
    }

    /// All classes in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.iter()
    }

    /// MRO of a class (empty for unknown ids).
    #[must_use]
    pub fn mro(&self, id: ClassId) -> &[ClassId] {
        self.classes
            .get(id.0 as usize)
            .map(|c| c.mro.as_slice())
            .unwrap_or(&[])
    }

    /// Plain subclass test (reflexive). Roles are not subclasses of their takers.
    #[must_use]
    pub fn is_subclass(&self, child: ClassId, parent: ClassId) -> bool {
        self.mro(child).contains(&parent)
    }

    /// `parent` and every class that has it in its MRO, in declaration order.
    #[must_use]
    pub fn subclasses_of(&self, parent: ClassId) -> Vec<ClassId> {
        self.classes
            .iter()
            .filter(|c| c.mro.contains(&parent))
            .map(|c| c.id)
            .collect()
    }

    /// Taker class of a role class, declared or inherited.
    #[must_use]
    pub fn role_taker_type(&self, id: ClassId) -> Option<ClassId> {
        self.classes.get(id.0 as usize)?.role_taker_type
    }

    /// Whether `id` is a role class.
    #[must_use]
    pub fn is_role_class(&self, id: ClassId) -> bool {
        self.role_taker_type(id).is_some()
    }

    /// Taker types along the chain: the taker type, its own taker type, and so on.
    #[must_use]
    pub fn all_role_taker_types(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut current = self.role_taker_type(id);
        while let Some(taker) = current {
            if out.contains(&taker) {
                break;
            }
            out.push(taker);
            current = self.role_taker_type(taker);
        }
        out
    }

    /// Find a field by name along the MRO. Returns the declaring class.
    #[must_use]
    pub fn field(&self, class: ClassId, name: NameId) -> Option<(ClassId, FieldDecl)> {
        self.mro(class).iter().find_map(|c| {
            let info = self.classes.get(c.0 as usize)?;
            info.fields.get(&name).map(|decl| (*c, *decl))
        })
    }

    // =========================================================================
    // FIELD NAMES
    // =========================================================================

    /// Intern a field name.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(id) = self.name_ids.get(name) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_ids.insert(name.to_string(), id);
        id
    }

    /// Look up an interned name without interning it.
    #[must_use]
    pub fn name_id(&self, name: &str) -> Option<NameId> {
        self.name_ids.get(name).copied()
    }

    /// The text of an interned name.
    #[must_use]
    pub fn field_name(&self, id: NameId) -> &str {
        self.names.get(id.0 as usize).map(String::as_str).unwrap_or("")
    }
}
