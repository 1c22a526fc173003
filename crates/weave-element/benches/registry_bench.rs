//! Benchmarks for creation-func resolution along declared type chains.
//!
//! Run with: cargo bench -p weave-element --bench registry_bench

use std::any::TypeId;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use weave_element::{CreationFunc, CreationRegistry, Element};
use weave_reactive::ObjectRef;

struct Level<const N: usize>;

macro_rules! chain {
    ($registry:expr; $($derived:literal => $base:literal),* $(,)?) => {
        $(
            $registry
                .declare_parent::<Level<$derived>, Level<$base>>(|_| Rc::new(Level::<$base>))
                .ok();
        )*
    };
}

fn registry() -> CreationRegistry {
    let mut registry = CreationRegistry::new();
    chain!(registry; 1 => 0, 2 => 1, 3 => 2, 4 => 3, 5 => 4, 6 => 5, 7 => 6, 8 => 7);
    registry.register::<Level<0>>(|_, _| Some(Element::label("root")));
    registry
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/resolve");
    let registry = registry();

    let keys = [
        (0, TypeId::of::<Level<0>>()),
        (4, TypeId::of::<Level<4>>()),
        (8, TypeId::of::<Level<8>>()),
    ];
    for (depth, key) in keys {
        group.bench_with_input(BenchmarkId::new("cached", depth), &key, |b, key| {
            b.iter(|| black_box(registry.resolve(*key)))
        });
    }
    group.finish();
}

fn bench_resolve_after_invalidation(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/invalidate");
    let mut registry = registry();
    let base = TypeId::of::<Level<0>>();
    let leaf = TypeId::of::<Level<8>>();
    let func = CreationFunc::erased(base, "Level<0>", |_, _| None);

    group.bench_function("register_then_resolve_depth8", |b| {
        b.iter(|| {
            registry.register_erased(base, func.clone());
            black_box(registry.resolve(leaf))
        })
    });
    group.finish();
}

fn bench_create(c: &mut Criterion) {
    let registry = registry();
    let object = ObjectRef::new(Level::<8>);
    c.bench_function("registry/create_depth8", |b| {
        b.iter(|| {
            let element = registry.create(None, black_box(&object));
            if let Some(element) = &element {
                element.destroy();
            }
            black_box(element)
        })
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_resolve_after_invalidation,
    bench_create
);
criterion_main!(benches);
