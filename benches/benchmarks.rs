criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(20)
        .measurement_time(std::time::Duration::from_secs(2));
    targets =
        building_single_item_lists,
        joining_two_item_lists,
        pruning_a_candidate_list,
        admitting_into_top_k,
        searching_a_small_database,
        mining_a_medium_database,
}

fn synthetic_database(transactions: usize, items: usize) -> (ProfitTable, Vec<Transaction>) {
    use rand::Rng;
    use rand::SeedableRng;
    let mut rng = rand::rngs::SmallRng::seed_from_u64(0xC0FFEE);

    let mut profits = HashMap::new();
    for item in 1..=items as u32 {
        let sign = if rng.random_bool(0.2) { -1.0 } else { 1.0 };
        profits.insert(item, sign * rng.random_range(1..=10) as f64);
    }
    let profits = ProfitTable::new(profits);

    let mut database = Vec::with_capacity(transactions);
    for tid in 1..=transactions as u32 {
        let span = rng.random_range(3..=items.min(8));
        let mut row = Vec::new();
        while row.len() < span {
            let item = rng.random_range(1..=items as u32);
            let qty = rng.random_range(1..=4);
            let prob = rng.random_range(50..=99) as f64 / 100.0;
            row.push((item, qty, prob));
        }
        row.sort_by_key(|&(item, ..)| item);
        row.dedup_by_key(|&mut (item, ..)| item);
        database.push(Transaction::new(tid, row));
    }
    (profits, database)
}

fn building_single_item_lists(c: &mut criterion::Criterion) {
    let (profits, database) = synthetic_database(200, 40);
    c.bench_function("build single-item utility lists (200 tx, 40 items)", |b| {
        b.iter(|| builder::build(&database, &profits, 10, 0.0).unwrap())
    });
}

fn joining_two_item_lists(c: &mut criterion::Criterion) {
    let (profits, database) = synthetic_database(200, 40);
    let out = builder::build(&database, &profits, 10, 0.0).unwrap();
    let mut items: Vec<_> = out.ranked_items.clone();
    items.sort_unstable();
    let a = &out.single_item_lists[&items[0]];
    let b = &out.single_item_lists[&items[1]];
    let stats = Stats::default();
    c.bench_function("join two single-item utility lists", |bench| {
        bench.iter(|| join::join(a, b, 0.0, &stats))
    });
}

fn pruning_a_candidate_list(c: &mut criterion::Criterion) {
    let (profits, database) = synthetic_database(200, 40);
    let out = builder::build(&database, &profits, 10, 0.0).unwrap();
    let item = out.ranked_items[0];
    let list = out.single_item_lists[&item].clone();
    let stats = Stats::default();
    c.bench_function("apply rules 1-3 to a utility list", |b| {
        b.iter(|| prune::check(&list, 0.0, 0.0, 1.0, &stats))
    });
}

fn admitting_into_top_k(c: &mut criterion::Criterion) {
    let topk = TopK::new(50);
    let stats = Stats::default();
    let mut n = 0u32;
    c.bench_function("try_add into a capacity-50 top-k", |b| {
        b.iter(|| {
            n += 1;
            topk.try_add(&[n], (n % 1000) as f64, 0.8, 1, &stats)
        })
    });
}

fn searching_a_small_database(c: &mut criterion::Criterion) {
    let (profits, database) = synthetic_database(60, 15);
    let config = MiningConfig::new(10, 0.0);
    c.bench_function("mine top-10 over 60 transactions / 15 items", |b| {
        b.iter(|| scheduler::run(&database, &profits, &config).unwrap())
    });
}

fn mining_a_medium_database(c: &mut criterion::Criterion) {
    let (profits, database) = synthetic_database(400, 35);
    let config = MiningConfig::new(10, 0.0);
    c.bench_function("mine top-10 over 400 transactions / 35 items", |b| {
        b.iter(|| scheduler::run(&database, &profits, &config).unwrap())
    });
}

use huim_miner::model::{ProfitTable, Transaction};
use huim_miner::stats::Stats;
use huim_miner::topk::TopK;
use huim_miner::{builder, join, prune, scheduler, MiningConfig};
use std::collections::HashMap;
