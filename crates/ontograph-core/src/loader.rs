//! # Bulk Loader
//!
//! Populates a knowledge base from externally constructed objects and
//! `(subject, field, object)` triples.
//!
//! Triples go through the ordinary write path, so inference runs for each of
//! them. The fixed point reached does not depend on the order of the triples.
//! A loader may therefore assert a relation before the triples that give its
//! inverse or super-property their context.

use crate::knowledge::KnowledgeBase;
use crate::symbol::Symbol;
use crate::types::{ClassId, NodeId, Result};
use tracing::{debug, info};

/// A predicate deciding whether a candidate class's axioms hold.
///
/// Supplied by the caller (typically a query/predicate layer). Any
/// `Fn(ClassId) -> bool` closure qualifies.
pub trait AxiomCheck {
    fn check_axiom(&self, candidate: ClassId) -> bool;
}

impl<F> AxiomCheck for F
where
    F: Fn(ClassId) -> bool,
{
    fn check_axiom(&self, candidate: ClassId) -> bool {
        self(candidate)
    }
}

/// One relation assertion.
#[derive(Debug, Clone)]
pub struct Triple {
    pub subject: Symbol,
    /// Field name, resolved on the subject's class and its role-taker types.
    pub field: String,
    pub object: Symbol,
}

impl Triple {
    #[must_use]
    pub fn new(subject: &Symbol, field: &str, object: &Symbol) -> Self {
        Self {
            subject: subject.clone(),
            field: field.to_string(),
            object: object.clone(),
        }
    }
}

/// Counts reported by a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Objects registered through `add_instance`.
    pub instances: usize,
    /// Triples asserted.
    pub triples: usize,
    /// Relations admitted to the graph, inferred ones included.
    pub relations_admitted: usize,
}

/// Loads objects and triples into a knowledge base.
#[derive(Debug)]
pub struct BulkLoader<'kb> {
    kb: &'kb mut KnowledgeBase,
    report: LoadReport,
    relations_at_start: usize,
}

impl<'kb> BulkLoader<'kb> {
    /// Start loading into `kb`.
    pub fn new(kb: &'kb mut KnowledgeBase) -> Self {
        let relations_at_start = kb.graph().relation_count();
        Self {
            kb,
            report: LoadReport::default(),
            relations_at_start,
        }
    }

    /// Register an externally constructed object.
    pub fn add_instance(&mut self, symbol: &Symbol) -> NodeId {
        self.report.instances += 1;
        self.kb.add_instance(symbol)
    }

    /// Assert `subject.field` relates to `object`.
    ///
    /// Collection fields gain the object as one more element; single fields
    /// are assigned.
    pub fn assert_triple(&mut self, subject: &Symbol, field: &str, object: &Symbol) -> Result<()> {
        let id = self.kb.field(subject.class(), field)?;
        debug!(subject = %subject, field, object = %object, "triple asserted");
        if self.kb.descriptors().get(id)?.shape().is_collection() {
            self.kb.collection(subject, id)?.add(object)?;
        } else {
            self.kb.set(subject, id, object)?;
        }
        self.report.triples += 1;
        Ok(())
    }

    /// Assert every triple in order and finish.
    pub fn load(mut self, triples: impl IntoIterator<Item = Triple>) -> Result<LoadReport> {
        for triple in triples {
            self.assert_triple(&triple.subject, &triple.field, &triple.object)?;
        }
        Ok(self.finish())
    }

    /// Among `candidates`, the most specific class whose axioms hold.
    #[must_use]
    pub fn resolve_domain_type(&self, candidates: &[ClassId], check: &impl AxiomCheck) -> Option<ClassId> {
        let survivors: Vec<ClassId> = candidates
            .iter()
            .copied()
            .filter(|c| check.check_axiom(*c))
            .collect();
        self.kb.classes().most_specific_type(&survivors)
    }

    /// Stop loading and report.
    #[must_use]
    pub fn finish(mut self) -> LoadReport {
        self.report.relations_admitted = self
            .kb
            .graph()
            .relation_count()
            .saturating_sub(self.relations_at_start);
        info!(
            instances = self.report.instances,
            triples = self.report.triples,
            relations = self.report.relations_admitted,
            "bulk load finished"
        );
        self.report
    }
}
