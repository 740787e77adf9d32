//! Depth-first enumeration of itemset extensions, driven by the current
//! top-k threshold. Implemented with an explicit stack rather than native
//! recursion: the poset of itemsets is finite but its depth is bounded only
//! by the number of distinct ranked items, which can exceed a comfortable
//! native stack depth.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::join;
use crate::model::UtilityList;
use crate::prune::{self, PruneVerdict};
use crate::stats::Stats;
use crate::topk::TopK;
use crate::EPSILON;

/// immutable, shared-by-reference bundle passed to every search task —
/// the mining-context record that avoids parent pointers between tasks.
pub struct Context<'a> {
    pub topk: &'a TopK,
    pub stats: &'a Stats,
    pub min_prob: f64,
    adaptive_alpha: bool,
    alpha_bits: AtomicU64,
    cancel: Option<&'a AtomicBool>,
}

const ALPHA_RECOMPUTE_INTERVAL: u64 = 256;

impl<'a> Context<'a> {
    pub fn new(topk: &'a TopK, stats: &'a Stats, min_prob: f64, adaptive_alpha: bool) -> Self {
        Self {
            topk,
            stats,
            min_prob,
            adaptive_alpha,
            alpha_bits: AtomicU64::new(1.0f64.to_bits()),
            cancel: None,
        }
    }

    /// wires a cooperative cancellation flag into this context. Checked at
    /// extension boundaries by `search` and the scheduler's task splits;
    /// never polled mid-join.
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |c| c.load(Ordering::Relaxed))
    }

    pub fn alpha(&self) -> f64 {
        if self.adaptive_alpha {
            f64::from_bits(self.alpha_bits.load(Ordering::Relaxed))
        } else {
            1.0
        }
    }

    fn maybe_recompute_alpha(&self) {
        if !self.adaptive_alpha {
            return;
        }
        let generated = self.stats.candidates_generated();
        if generated == 0 || generated % ALPHA_RECOMPUTE_INTERVAL != 0 {
            return;
        }
        let pruned = self.stats.candidates_pruned();
        let next = prune::adaptive_alpha(self.alpha(), pruned, generated);
        self.alpha_bits.store(next.to_bits(), Ordering::Relaxed);
    }

    /// offers a utility list to the top-k if it currently qualifies.
    pub fn offer(&self, list: &UtilityList) {
        let tau = self.topk.tau();
        if prune::qualifies_for_topk(list, tau, self.min_prob) {
            self.topk.try_add(
                &list.itemset,
                list.sum_eu,
                list.exist_prob,
                list.elements.len() as u32,
                self.stats,
            );
        }
    }
}

struct Frame {
    prefix: UtilityList,
    extensions: Vec<UtilityList>,
}

/// `search(prefix, extensions)` of the design: `extensions` must already be
/// filtered by RTWU against the threshold in force when the caller built
/// them (the top-level seeding step, or this function's own recursive
/// step, both honour that precondition).
pub fn search(ctx: &Context, prefix: UtilityList, extensions: Vec<UtilityList>) {
    let mut stack = vec![Frame { prefix, extensions }];

    while let Some(mut frame) = stack.pop() {
        if ctx.is_cancelled() {
            return;
        }
        if frame.extensions.is_empty() {
            continue;
        }

        let tau = ctx.topk.tau();
        if prune::bulk_branch_prune(frame.prefix.rtwu, &frame.extensions, tau, ctx.stats) {
            continue;
        }

        // best-first exploration: highest-rtwu extensions first, so tau
        // rises as early as possible within this branch.
        frame
            .extensions
            .sort_by(|a, b| b.rtwu.partial_cmp(&a.rtwu).unwrap_or(std::cmp::Ordering::Equal));

        for i in 0..frame.extensions.len() {
            if ctx.is_cancelled() {
                return;
            }
            let tau = ctx.topk.tau();
            let alpha = ctx.alpha();

            let Some(joined) = join::join(&frame.prefix, &frame.extensions[i], alpha * tau, ctx.stats) else {
                continue;
            };
            ctx.stats.inc_utility_lists_created();
            ctx.stats.inc_candidates_generated();
            ctx.maybe_recompute_alpha();

            if prune::check(&joined, tau, ctx.min_prob, alpha, ctx.stats) != PruneVerdict::Keep {
                continue;
            }

            ctx.offer(&joined);

            let new_extensions: Vec<UtilityList> = frame.extensions[i + 1..]
                .iter()
                .filter(|e| e.rtwu >= tau - EPSILON)
                .cloned()
                .collect();

            if !new_extensions.is_empty() {
                stack.push(Frame {
                    prefix: joined,
                    extensions: new_extensions,
                });
            }
        }
    }
}
