//! Benchmarks for CFR solver.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use extensive_cfr::cfr::{BestResponse, CFRConfig, CFRSolver};
use extensive_cfr::games::kuhn::KuhnPoker;
use extensive_cfr::games::settlement::SettlementGame;

fn kuhn_vanilla_iteration_benchmark(c: &mut Criterion) {
    let solver = CFRSolver::new(KuhnPoker::new(), CFRConfig::vanilla()).unwrap();

    c.bench_function("kuhn_vanilla_iteration", |b| {
        b.iter(|| black_box(solver.run_vanilla_iteration(&[1.0, 1.0])))
    });
}

fn kuhn_probing_iteration_benchmark(c: &mut Criterion) {
    let solver = CFRSolver::new(KuhnPoker::new(), CFRConfig::probing().with_seed(42)).unwrap();
    let mut seed = 0u64;

    c.bench_function("kuhn_probing_iteration", |b| {
        b.iter(|| {
            seed += 1;
            solver.run_probing_iteration(black_box(seed))
        })
    });
}

fn kuhn_1000_iterations_benchmark(c: &mut Criterion) {
    c.bench_function("kuhn_1000_iterations", |b| {
        b.iter(|| {
            let mut solver = CFRSolver::new(KuhnPoker::new(), CFRConfig::vanilla()).unwrap();
            solver.train(black_box(1000)).info_sets
        })
    });
}

fn settlement_exploitability_benchmark(c: &mut Criterion) {
    let mut solver = CFRSolver::new(SettlementGame::new(), CFRConfig::vanilla()).unwrap();
    solver.train(1000);
    let best_response = BestResponse::new(solver.game(), solver.table());

    c.bench_function("settlement_exploitability", |b| {
        b.iter(|| black_box(best_response.exploitability()))
    });
}

criterion_group!(
    benches,
    kuhn_vanilla_iteration_benchmark,
    kuhn_probing_iteration_benchmark,
    kuhn_1000_iterations_benchmark,
    settlement_exploitability_benchmark
);
criterion_main!(benches);
