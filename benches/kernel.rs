use criterion::{criterion_group, criterion_main, Criterion};
use uacalc_kernel::prelude::*;

fn z6() -> BasicAlgebra {
    let mut table = Vec::with_capacity(36);
    for a in 0..6 {
        for b in 0..6 {
            table.push((a + b) % 6);
        }
    }
    BasicAlgebra::from_tables("Z6", 6, &[("+", 2, table)]).unwrap()
}

fn bench_cg(c: &mut Criterion) {
    c.bench_function("cg Z6", |b| {
        b.iter(|| {
            let alg = z6();
            alg.con().cg(0, 2).unwrap()
        })
    });
}

fn bench_con_universe(c: &mut Criterion) {
    c.bench_function("con universe Z6", |b| {
        b.iter(|| {
            let alg = z6();
            alg.con().cardinality().unwrap()
        })
    });
}

fn bench_sg(c: &mut Criterion) {
    c.bench_function("sg Z6", |b| {
        b.iter(|| {
            let alg = z6();
            alg.sub().sg(&[2]).unwrap()
        })
    });
}

criterion_group!(benches, bench_cg, bench_con_universe, bench_sg);
criterion_main!(benches);
