//! Atomic statistics counters for a mining run, grounded on the reference
//! crate's `Metrics`/`Worker` pattern: plain `AtomicUsize`/`AtomicU64`
//! fields, `fetch_add(_, Ordering::Relaxed)` writers, `load(Ordering::Relaxed)`
//! readers, and a small set of derived ratios computed on read rather than
//! maintained incrementally.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct Stats {
    candidates_generated: AtomicU64,
    candidates_pruned: AtomicU64,
    utility_lists_created: AtomicU64,
    rtwu_pruned: AtomicU64,
    eu_pruned: AtomicU64,
    ep_pruned: AtomicU64,
    branch_pruned: AtomicU64,
    bulk_branch_pruned: AtomicU64,
    successful_updates: AtomicU64,
    cas_retries: AtomicU64,
    peak_memory_bytes: AtomicU64,
    started: Instant,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            candidates_generated: AtomicU64::new(0),
            candidates_pruned: AtomicU64::new(0),
            utility_lists_created: AtomicU64::new(0),
            rtwu_pruned: AtomicU64::new(0),
            eu_pruned: AtomicU64::new(0),
            ep_pruned: AtomicU64::new(0),
            branch_pruned: AtomicU64::new(0),
            bulk_branch_pruned: AtomicU64::new(0),
            successful_updates: AtomicU64::new(0),
            cas_retries: AtomicU64::new(0),
            peak_memory_bytes: AtomicU64::new(0),
            started: Instant::now(),
        }
    }
}

impl Stats {
    pub fn inc_candidates_generated(&self) {
        self.candidates_generated.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_utility_lists_created(&self) {
        self.utility_lists_created.fetch_add(1, Ordering::Relaxed);
    }
    /// rule 1 (§4.3): the joined candidate's RTWU already falls below the
    /// threshold, so neither it nor anything built on top of it can
    /// qualify — this cuts off the whole subtree rooted at this node, not
    /// just the one candidate, so it also counts toward `branchPruned`.
    pub fn inc_rtwu_pruned(&self) {
        self.rtwu_pruned.fetch_add(1, Ordering::Relaxed);
        self.candidates_pruned.fetch_add(1, Ordering::Relaxed);
        self.branch_pruned.fetch_add(1, Ordering::Relaxed);
    }
    /// rule 3 (§4.3): the joined candidate's upper bound falls below the
    /// threshold. Also a single-node branch cut; see `inc_rtwu_pruned`.
    pub fn inc_eu_pruned(&self) {
        self.eu_pruned.fetch_add(1, Ordering::Relaxed);
        self.candidates_pruned.fetch_add(1, Ordering::Relaxed);
        self.branch_pruned.fetch_add(1, Ordering::Relaxed);
    }
    /// rule 2 (§4.3): the joined candidate's existential probability falls
    /// below `minProb`. Also a single-node branch cut; see `inc_rtwu_pruned`.
    pub fn inc_ep_pruned(&self) {
        self.ep_pruned.fetch_add(1, Ordering::Relaxed);
        self.candidates_pruned.fetch_add(1, Ordering::Relaxed);
        self.branch_pruned.fetch_add(1, Ordering::Relaxed);
    }
    /// rule 4 (§4.3): an entire sibling group of extensions is discarded at
    /// once, before any of them are individually joined. Counted
    /// separately from `branchPruned`, which tracks single-node cuts from
    /// rules 1-3.
    pub fn inc_bulk_branch_pruned(&self, branch_size: usize) {
        self.bulk_branch_pruned.fetch_add(1, Ordering::Relaxed);
        self.candidates_pruned
            .fetch_add(branch_size as u64, Ordering::Relaxed);
    }
    pub fn inc_successful_update(&self) {
        self.successful_updates.fetch_add(1, Ordering::Relaxed);
    }
    pub fn add_cas_retries(&self, n: u64) {
        self.cas_retries.fetch_add(n, Ordering::Relaxed);
    }
    /// records an observed allocation size, keeping the running peak via
    /// `fetch_max`. Called at join-buffer sizing time (`join::join`) and
    /// once more for the resident single-item-list and top-k footprint in
    /// `scheduler::run_cancellable`, so the reported peak reflects real
    /// allocations rather than staying permanently zero.
    pub fn observe_memory(&self, bytes: u64) {
        self.peak_memory_bytes.fetch_max(bytes, Ordering::Relaxed);
    }

    pub fn candidates_generated(&self) -> u64 {
        self.candidates_generated.load(Ordering::Relaxed)
    }
    pub fn candidates_pruned(&self) -> u64 {
        self.candidates_pruned.load(Ordering::Relaxed)
    }
    pub fn utility_lists_created(&self) -> u64 {
        self.utility_lists_created.load(Ordering::Relaxed)
    }
    pub fn rtwu_pruned(&self) -> u64 {
        self.rtwu_pruned.load(Ordering::Relaxed)
    }
    pub fn eu_pruned(&self) -> u64 {
        self.eu_pruned.load(Ordering::Relaxed)
    }
    pub fn ep_pruned(&self) -> u64 {
        self.ep_pruned.load(Ordering::Relaxed)
    }
    pub fn branch_pruned(&self) -> u64 {
        self.branch_pruned.load(Ordering::Relaxed)
    }
    pub fn bulk_branch_pruned(&self) -> u64 {
        self.bulk_branch_pruned.load(Ordering::Relaxed)
    }
    pub fn successful_updates(&self) -> u64 {
        self.successful_updates.load(Ordering::Relaxed)
    }
    pub fn cas_retries(&self) -> u64 {
        self.cas_retries.load(Ordering::Relaxed)
    }
    pub fn peak_memory_bytes(&self) -> u64 {
        self.peak_memory_bytes.load(Ordering::Relaxed)
    }
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn pruning_effectiveness(&self) -> f64 {
        let generated = self.candidates_generated();
        if generated == 0 {
            0.0
        } else {
            self.candidates_pruned() as f64 / generated as f64
        }
    }

    pub fn cas_efficiency(&self) -> f64 {
        let successes = self.successful_updates();
        let retries = self.cas_retries();
        let denom = successes + retries;
        if denom == 0 {
            1.0
        } else {
            successes as f64 / denom as f64
        }
    }

    /// a human-readable summary line, mirroring `TrainingStats::stats()`'s
    /// "derive a formatted view from raw atomics on demand" shape.
    pub fn summary(&self) -> String {
        format!(
            "candidates={} pruned={} ({:.1}%) branch={} bulk_branch={} lists={} cas_retries={} cas_eff={:.1}% peak_mem={}B elapsed={}ms",
            self.candidates_generated(),
            self.candidates_pruned(),
            self.pruning_effectiveness() * 100.0,
            self.branch_pruned(),
            self.bulk_branch_pruned(),
            self.utility_lists_created(),
            self.cas_retries(),
            self.cas_efficiency() * 100.0,
            self.peak_memory_bytes(),
            self.elapsed_ms()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_monotone_and_consistent() {
        let s = Stats::default();
        s.inc_rtwu_pruned();
        s.inc_eu_pruned();
        s.inc_bulk_branch_pruned(3);
        assert_eq!(s.candidates_pruned(), 5);
        assert_eq!(s.rtwu_pruned(), 1);
        assert_eq!(s.eu_pruned(), 1);
        assert_eq!(s.bulk_branch_pruned(), 1);
        // rtwu/eu/ep each cut a single node's subtree; bulk-branch prunes
        // a whole sibling group at once and is tracked separately.
        assert_eq!(s.branch_pruned(), 2);
    }

    #[test]
    fn observe_memory_tracks_a_running_peak() {
        let s = Stats::default();
        s.observe_memory(128);
        s.observe_memory(64);
        s.observe_memory(256);
        assert_eq!(s.peak_memory_bytes(), 256);
    }

    #[test]
    fn pruning_effectiveness_is_a_ratio() {
        let s = Stats::default();
        for _ in 0..10 {
            s.inc_candidates_generated();
        }
        for _ in 0..4 {
            s.inc_rtwu_pruned();
        }
        assert!((s.pruning_effectiveness() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn cas_efficiency_defaults_to_one_with_no_activity() {
        let s = Stats::default();
        assert_eq!(s.cas_efficiency(), 1.0);
    }
}
