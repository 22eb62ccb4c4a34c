use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use plonk_bridge::plonk_core::circuit::{GateType, Wires};
use plonk_bridge::plonk_core::Fp;
use plonk_bridge::{Bridge, BridgeConfig};

fn bench_field_mul(c: &mut Criterion) {
    let bridge = Bridge::new(BridgeConfig::default()).unwrap();
    let fp = bridge.fp();
    let a = fp.rng(1).unwrap();
    let b = fp.rng(2).unwrap();

    let mut group = c.benchmark_group("Fp through the bridge");
    group.bench_function("mul", |bench| bench.iter(|| fp.mul(&a, &b).unwrap()));
    group.bench_function("inv", |bench| bench.iter(|| fp.inv(&a).unwrap()));
    group.bench_function("to_string", |bench| bench.iter(|| fp.to_string(&a).unwrap()));
    group.finish();
}

fn bench_scale(c: &mut Criterion) {
    let bridge = Bridge::new(BridgeConfig::default()).unwrap();
    let vesta = bridge.vesta();
    let g = vesta.one().unwrap();
    let k = bridge.fp().rng(7).unwrap();

    c.bench_function("Vesta scale", |bench| bench.iter(|| vesta.scale(&g, &k).unwrap()));
}

fn bench_prove(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prove public gates");
    group.sample_size(10);

    for &rows in &[1u32, 8, 32] {
        let bridge = Bridge::new(BridgeConfig::default()).unwrap();
        let plonk = bridge.fp_plonk();
        let urs = plonk.urs_create(64).unwrap();
        let gates = plonk.gate_vector().unwrap();
        for row in 0..rows {
            let gate = plonk
                .gate(GateType::Generic, Wires::trivial(row), vec![Fp::from(1)])
                .unwrap();
            plonk.gate_vector_add(&gates, gate).unwrap();
        }
        let index = plonk.index_create(&gates, rows as i32, &urs).unwrap();
        let primary = (0..rows as u64).map(Fp::from).collect::<Vec<_>>();

        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |bench, _| {
            bench.iter_batched(
                || index.deep_copy().unwrap(),
                |index| plonk.proof_create(index, &primary, &[], &[], vec![]).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(field_ops, bench_field_mul, bench_scale, bench_prove);
criterion_main!(field_ops);
