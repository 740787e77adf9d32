//! Work-stealing parallel driver over the top-level prefix enumeration.
//!
//! Two task shapes, both grounded on the reference crate's `rayon::join`
//! fork/merge pattern in `clustering/kmeans.rs`:
//!
//! - a *prefix task* owns a contiguous range of top-level ranked items and
//!   recursively halves itself via `rayon::join` until a range is small
//!   enough (`TASK_GRANULARITY`) to drive sequentially;
//! - an *extension task* owns a contiguous range of one prefix's sorted
//!   extension list and halves itself the same way, applying bulk-branch
//!   pruning at the subtree root before committing to the split.
//!
//! Both shapes read from the same globally-ranked item order and the same
//! full extension list regardless of which half of a split they ended up
//! in, so narrowing a range never narrows the items a branch is allowed to
//! extend with — only which thread gets to explore it first.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::builder::{self, BuildOutput};
use crate::error::{MiningError, MiningResult};
use crate::model::{ProfitTable, Transaction, UtilityList};
use crate::search::{self, Context};
use crate::stats::Stats;
use crate::topk::TopK;
use crate::{MiningConfig, PARALLEL_THRESHOLD, TASK_GRANULARITY};
use crate::EPSILON;

/// outcome of a complete mining run: the final top-k snapshot plus the
/// counters accumulated along the way.
pub struct MiningRun {
    pub results: Vec<crate::model::TopKEntry>,
    pub stats: Stats,
}

/// builds the utility lists and drives the search to completion, choosing
/// between a sequential sweep and a work-stealing pool based on the number
/// of top-level ranked items.
pub fn run(
    database: &[Transaction],
    profits: &ProfitTable,
    config: &MiningConfig,
) -> MiningResult<MiningRun> {
    run_cancellable(database, profits, config, None)
}

/// as `run`, but honours a caller-supplied cancellation flag: in-flight
/// tasks return at the next extension boundary once it is observed set,
/// rather than running the search to completion.
pub fn run_cancellable(
    database: &[Transaction],
    profits: &ProfitTable,
    config: &MiningConfig,
    cancel: Option<&AtomicBool>,
) -> MiningResult<MiningRun> {
    let build = builder::build(database, profits, config.k, config.min_prob)?;
    let topk = TopK::new(config.k);
    let stats = Stats::default();
    let resident: u64 = build
        .single_item_lists
        .values()
        .map(|l| (l.elements.capacity() * std::mem::size_of::<crate::model::UtilityListElement>()) as u64)
        .sum();
    stats.observe_memory(resident);
    let mut ctx = Context::new(&topk, &stats, config.min_prob, config.adaptive_alpha);
    if let Some(c) = cancel {
        ctx = ctx.with_cancel(c);
    }

    let n = build.ranked_items.len();
    if n < PARALLEL_THRESHOLD {
        log::info!(
            "sequential fallback: {n} top-level items below parallel threshold {PARALLEL_THRESHOLD}"
        );
        drive_range(&ctx, &build, 0, n);
    } else {
        let threads = config.threads.unwrap_or_else(num_cpus::get);
        log::info!("driving {n} top-level items across a {threads}-thread pool");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| MiningError::ResourceExhaustion(e.to_string()))?;
        pool.install(|| fork_prefix_range(&ctx, &build, 0, n));
    }

    if ctx.is_cancelled() {
        log::info!("mining run cancelled; returning partial results");
    }

    let results = topk.get_top_k();
    let results_bytes: u64 = results
        .iter()
        .map(|e| {
            (e.items.capacity() * std::mem::size_of::<crate::model::ItemId>()
                + std::mem::size_of::<crate::model::TopKEntry>()) as u64
        })
        .sum();
    stats.observe_memory(results_bytes);

    Ok(MiningRun { results, stats })
}

/// recursively halves the top-level range `[lo, hi)` until it is small
/// enough to drive sequentially, then does so. Each half still seeds every
/// item's search with the *complete* suffix of ranked items after it, so
/// splitting never changes which itemsets a branch is allowed to consider.
fn fork_prefix_range(ctx: &Context, build: &BuildOutput, lo: usize, hi: usize) {
    if hi <= lo || ctx.is_cancelled() {
        return;
    }
    let len = hi - lo;
    if len <= TASK_GRANULARITY {
        drive_range(ctx, build, lo, hi);
        return;
    }
    let mid = lo + len / 2;
    rayon::join(
        || fork_prefix_range(ctx, build, lo, mid),
        || fork_prefix_range(ctx, build, mid, hi),
    );
}

/// sequential sweep over top-level items `[lo, hi)`: offers each one's
/// single-item list, then drives (or further parallelises) its extension
/// search.
fn drive_range(ctx: &Context, build: &BuildOutput, lo: usize, hi: usize) {
    let order = &build.ranked_items;
    for pos in lo..hi {
        if ctx.is_cancelled() {
            return;
        }
        let item = order[pos];
        let Some(prefix) = build.single_item_lists.get(&item).cloned() else {
            continue;
        };
        ctx.offer(&prefix);

        let tau = ctx.topk.tau();
        let mut extensions: Vec<UtilityList> = order[pos + 1..]
            .iter()
            .filter_map(|i| build.single_item_lists.get(i).cloned())
            .filter(|e| e.rtwu >= tau - EPSILON)
            .collect();
        extensions.sort_by(|a, b| b.rtwu.partial_cmp(&a.rtwu).unwrap_or(std::cmp::Ordering::Equal));

        if extensions.len() >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1 {
            let prefix = Arc::new(prefix);
            let extensions = Arc::new(extensions);
            let n = extensions.len();
            fork_extension_range(ctx, &prefix, &extensions, 0, n);
        } else {
            search::search(ctx, prefix, extensions);
        }
    }
}

/// the extension-list analogue of `fork_prefix_range`: splits the range
/// `[lo, hi)` of an already rtwu-descending-sorted extension list, applying
/// bulk-branch pruning to the whole range before committing to either a
/// sequential sweep or a further split.
fn fork_extension_range(
    ctx: &Context,
    prefix: &Arc<UtilityList>,
    extensions: &Arc<Vec<UtilityList>>,
    lo: usize,
    hi: usize,
) {
    if hi <= lo || ctx.is_cancelled() {
        return;
    }

    let tau = ctx.topk.tau();
    if crate::prune::bulk_branch_prune(prefix.rtwu, &extensions[lo..hi], tau, ctx.stats) {
        return;
    }

    let len = hi - lo;
    if len <= TASK_GRANULARITY {
        for i in lo..hi {
            if ctx.is_cancelled() {
                return;
            }
            let tau = ctx.topk.tau();
            let alpha = ctx.alpha();
            let Some(joined) = crate::join::join(prefix, &extensions[i], alpha * tau, ctx.stats) else {
                continue;
            };
            ctx.stats.inc_utility_lists_created();
            ctx.stats.inc_candidates_generated();
            if crate::prune::check(&joined, tau, ctx.min_prob, alpha, ctx.stats)
                != crate::prune::PruneVerdict::Keep
            {
                continue;
            }
            ctx.offer(&joined);

            let new_extensions: Vec<UtilityList> = extensions[i + 1..]
                .iter()
                .filter(|e| e.rtwu >= tau - EPSILON)
                .cloned()
                .collect();
            if !new_extensions.is_empty() {
                search::search(ctx, joined, new_extensions);
            }
        }
        return;
    }

    let mid = lo + len / 2;
    rayon::join(
        || fork_extension_range(ctx, prefix, extensions, lo, mid),
        || fork_extension_range(ctx, prefix, extensions, mid, hi),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn profits(pairs: &[(u32, f64)]) -> ProfitTable {
        ProfitTable::new(pairs.iter().copied().collect::<HashMap<_, _>>())
    }

    #[test]
    fn sequential_and_parallel_paths_agree_on_a_small_database() {
        let database = vec![
            Transaction::new(1, vec![(1, 2, 0.9), (2, 4, 0.8)]),
            Transaction::new(2, vec![(1, 1, 0.7), (2, 2, 0.6), (3, 3, 0.5)]),
            Transaction::new(3, vec![(2, 1, 0.9), (3, 2, 0.8)]),
        ];
        let profits = profits(&[(1, 5.0), (2, 10.0), (3, -2.0)]);
        let config = MiningConfig::new(2, 0.0);

        let run1 = run(&database, &profits, &config).unwrap();
        let run2 = run(&database, &profits, &config).unwrap();

        let keys = |run: &MiningRun| {
            let mut v: Vec<Vec<u32>> = run
                .results
                .iter()
                .map(|e| {
                    let mut items = e.items.clone();
                    items.sort_unstable();
                    items
                })
                .collect();
            v.sort();
            v
        };
        assert_eq!(keys(&run1), keys(&run2));
        assert!(run1.results.len() <= 2);
    }

    #[test]
    fn cancellation_stops_the_run_early() {
        let database = vec![Transaction::new(1, vec![(1, 2, 0.9), (2, 4, 0.8)])];
        let profits = profits(&[(1, 5.0), (2, 10.0)]);
        let config = MiningConfig::new(1, 0.0);
        let cancel = AtomicBool::new(true);
        let run = run_cancellable(&database, &profits, &config, Some(&cancel)).unwrap();
        assert_eq!(run.results.len(), 0);
    }

    #[test]
    fn empty_database_is_rejected_before_scheduling() {
        let profits = profits(&[(1, 5.0)]);
        let config = MiningConfig::new(1, 0.0);
        let err = run(&[], &profits, &config).unwrap_err();
        assert!(matches!(err, MiningError::InvalidInput(_)));
    }

    #[test]
    fn k_equals_one_returns_a_single_winner() {
        let database = vec![
            Transaction::new(1, vec![(1, 2, 0.9), (2, 4, 0.8)]),
            Transaction::new(2, vec![(1, 1, 0.6), (2, 1, 0.5)]),
        ];
        let profits = profits(&[(1, 5.0), (2, 10.0)]);
        let config = MiningConfig::new(1, 0.0);
        let run = run(&database, &profits, &config).unwrap();
        assert!(run.results.len() <= 1);
    }

    #[test]
    fn min_prob_of_one_admits_only_certain_itemsets() {
        let database = vec![Transaction::new(1, vec![(1, 2, 1.0), (2, 4, 0.9)])];
        let profits = profits(&[(1, 5.0), (2, 10.0)]);
        let config = MiningConfig::new(5, 1.0);
        let run = run(&database, &profits, &config).unwrap();
        for entry in &run.results {
            assert!((entry.probability - 1.0).abs() < crate::EPSILON);
        }
    }

    #[test]
    fn all_negative_profits_yield_no_itemsets() {
        let database = vec![Transaction::new(1, vec![(1, 2, 0.9), (2, 4, 0.8)])];
        let profits = profits(&[(1, -5.0), (2, -10.0)]);
        let config = MiningConfig::new(5, 0.0);
        let run = run(&database, &profits, &config).unwrap();
        assert!(run.results.is_empty());
    }
}
