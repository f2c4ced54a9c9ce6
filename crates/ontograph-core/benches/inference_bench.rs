//! # Inference Benchmarks
//!
//! Cost of reaching the fixed point for closure-heavy workloads.
//!
//! Run with: `cargo bench -p ontograph-core`

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ontograph_core::{
    ClassId, ContainerKind, FieldId, FieldShape, KnowledgeBase, PropertySpec, Semantics, Symbol,
};
use std::hint::black_box;

/// A knowledge base with one class, a transitive `part_of` field and a
/// `parent_of` field whose two-link chain gives `ancestor_of`.
fn knowledge_base() -> (KnowledgeBase, ClassId, FieldId, FieldId) {
    let mut kb = KnowledgeBase::new();
    let diagram = kb.classes_mut();
    let node = diagram.declare_class("Node", &[]).expect("Node");
    let set = FieldShape::Collection(ContainerKind::Set);
    for name in ["part_of", "parent_of", "ancestor_of"] {
        diagram.declare_field(node, name, node, set).expect(name);
    }

    let catalog = kb.properties_mut();
    let part_of = catalog
        .declare(
            "PartOf",
            PropertySpec::new().with_semantics(Semantics::none().transitive()),
        )
        .expect("PartOf");
    let parent_of = catalog.declare("ParentOf", PropertySpec::new()).expect("ParentOf");
    let ancestor_of = catalog
        .declare("AncestorOf", PropertySpec::new())
        .expect("AncestorOf");
    catalog
        .add_chain_axiom(ancestor_of, &[parent_of, parent_of])
        .expect("chain");
    catalog
        .add_chain_axiom(ancestor_of, &[parent_of, ancestor_of])
        .expect("chain");

    let part_of = kb.attach(part_of, node, "part_of").expect("attach");
    let parent_of = kb.attach(parent_of, node, "parent_of").expect("attach");
    kb.attach(ancestor_of, node, "ancestor_of").expect("attach");
    (kb, node, part_of, parent_of)
}

/// Link `size` fresh nodes into a line through `field`.
fn link_line(kb: &mut KnowledgeBase, class: ClassId, field: FieldId, size: usize) -> Vec<Symbol> {
    let nodes: Vec<Symbol> = (0..size)
        .map(|i| kb.create(class, format!("n{i}")).expect("create"))
        .collect();
    for pair in nodes.windows(2) {
        kb.collection(&pair[0], field)
            .expect("collection")
            .add(&pair[1])
            .expect("add");
    }
    nodes
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_transitive_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitive_closure");

    for size in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let (mut kb, node, part_of, _) = knowledge_base();
                let nodes = link_line(&mut kb, node, part_of, size);
                black_box((kb.graph().relation_count(), nodes))
            });
        });
    }

    group.finish();
}

fn bench_chain_axioms(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_axioms");

    for size in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let (mut kb, node, _, parent_of) = knowledge_base();
                let nodes = link_line(&mut kb, node, parent_of, size);
                black_box((kb.graph().relation_count(), nodes))
            });
        });
    }

    group.finish();
}

fn bench_extend_closed_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("extend_closed_line");

    for size in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || {
                    let (mut kb, node, part_of, _) = knowledge_base();
                    let nodes = link_line(&mut kb, node, part_of, size);
                    let tail = kb.create(node, "tail").expect("tail");
                    (kb, part_of, nodes, tail)
                },
                |(mut kb, part_of, nodes, tail)| {
                    if let Some(last) = nodes.last() {
                        kb.collection(last, part_of)
                            .expect("collection")
                            .add(&tail)
                            .expect("add");
                    }
                    black_box((kb.graph().relation_count(), nodes, tail))
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_transitive_closure,
    bench_chain_axioms,
    bench_extend_closed_line
);
criterion_main!(benches);
