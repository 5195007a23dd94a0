//! Recalculation cost for two shapes of sheet:
//!
//! 1) A long chain where each cell reads the one above it, so changing the
//!    head recomputes every cell in order.
//! 2) A single SUM over a wide column, so one formula reads many cells.
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use gridcalc::Engine;

const CHAIN_LENGTHS: [u32; 3] = [100, 1_000, 10_000];
const COLUMN_HEIGHTS: [u32; 3] = [1_000, 10_000, 60_000];

fn chain(rows: u32) -> Engine {
    let mut engine = Engine::new();
    engine.set_input(0, 0, "1").unwrap();
    for row in 1..rows {
        engine
            .set_formula(row, 0, &format!("A{}+1", row))
            .unwrap();
    }
    engine
}

fn column(rows: u32) -> Engine {
    let mut engine = Engine::new();
    for row in 0..rows {
        engine.set_input(row, 0, &(row % 100).to_string()).unwrap();
    }
    engine.set_formula(0, 1, &format!("SUM(A1:A{})", rows)).unwrap();
    engine
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_head_update");
    for rows in CHAIN_LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter_batched(
                || chain(rows),
                |mut engine| black_box(engine.set_input(0, 0, "2").unwrap().cells_recomputed),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_wide_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_sum_update");
    for rows in COLUMN_HEIGHTS {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter_batched(
                || column(rows),
                |mut engine| black_box(engine.set_input(rows / 2, 0, "7").unwrap().cells_recomputed),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_wide_sum_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_sum_set_formula");
    for rows in COLUMN_HEIGHTS {
        let mut engine = column(rows);
        let source = format!("SUM(A1:A{})", rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| black_box(engine.set_formula(0, 1, &source).unwrap().cells_recomputed));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain, bench_wide_sum, bench_wide_sum_setup);
criterion_main!(benches);
