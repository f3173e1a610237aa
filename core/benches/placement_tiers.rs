/**
 * Placement benchmarks over the built-in stages.
 *
 * Focus:
 * - Up-front packing of a whole stage (`pack_all`)
 * - Feasibility checks on a fresh board (`FeasibilityOracle::check_board`)
 * - A full incremental dig-through of one stage
 */
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use gemdig_core::*;
use rand::prelude::*;

const SEED: u64 = 20_240_611;

fn fresh_stage(catalog: &Catalog, id: StageId) -> Stage {
    let mut rng = SmallRng::seed_from_u64(SEED);
    Stage::load(catalog, id, &EngineConfig::default(), &mut rng).unwrap()
}

fn bench_pack_all(c: &mut Criterion) {
    let catalog = Catalog::builtin();
    let engine = EngineConfig::default();

    for config in catalog.stages() {
        let stage = fresh_stage(&catalog, config.id);
        c.bench_function(&format!("packer.pack_all.stage_{}", config.id), |b| {
            b.iter_batched(
                || SmallRng::seed_from_u64(SEED),
                |mut rng| black_box(pack_all(stage.board(), stage.pool(), &engine, &mut rng)),
                BatchSize::SmallInput,
            );
        });
    }
}

fn bench_oracle(c: &mut Criterion) {
    let catalog = Catalog::builtin();
    let oracle = FeasibilityOracle::default();

    for config in catalog.stages() {
        let stage = fresh_stage(&catalog, config.id);
        c.bench_function(&format!("oracle.check_board.stage_{}", config.id), |b| {
            b.iter(|| black_box(oracle.check_board(stage.board(), stage.pool())));
        });
    }
}

fn bench_dig_through(c: &mut Criterion) {
    c.bench_function("session.dig_through.stage_3", |b| {
        b.iter_batched(
            || {
                let mut session = StageSession::builtin(EngineConfig::default().without_cooldown(), SEED);
                session.ledger_mut().credit(10_000);
                session.load_stage(3).unwrap();
                session
            },
            |mut session| {
                let (width, height) = session.stage().unwrap().board().size();
                for y in 0..height {
                    for x in 0..width {
                        black_box(session.dig_cell((x, y)));
                    }
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_pack_all, bench_oracle, bench_dig_through);
criterion_main!(benches);
