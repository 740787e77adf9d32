//! Lock-free top-K maintainer.
//!
//! Backed by a fixed-size array of `ArcSwapOption` slots (the same
//! published-shared-state primitive the wider ecosystem reaches for when it
//! needs CAS-style updates without a lock — see e.g. `arc-swap` in
//! substrate-archive-backend and rusty-kaspa). Each slot publishes its
//! entry independently; `tryAdd` never takes a lock spanning more than one
//! slot's read-modify-write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::model::{compare_entries, ItemId, TopKEntry};
use crate::stats::Stats;
use crate::EPSILON;

pub struct TopK {
    k: usize,
    slots: Vec<ArcSwapOption<TopKEntry>>,
    tau_bits: AtomicU64,
    sequence: AtomicU64,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        assert!(k >= 1, "k must be >= 1");
        Self {
            k,
            slots: (0..k).map(|_| ArcSwapOption::new(None)).collect(),
            tau_bits: AtomicU64::new(0f64.to_bits()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// cached threshold, published by the most recent successful update
    /// that raised the k-th best expected utility. Zero while fewer than
    /// k entries are resident.
    pub fn tau(&self) -> f64 {
        f64::from_bits(self.tau_bits.load(Ordering::Acquire))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.load().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// attempts to admit `(items, eu, prob, support)` into the top-k.
    /// Returns true if it is now resident (freshly inserted or replacing a
    /// weaker/duplicate entry), false if rejected.
    pub fn try_add(
        &self,
        items: &[ItemId],
        eu: f64,
        prob: f64,
        support: u32,
        stats: &Stats,
    ) -> bool {
        let tau = self.tau();
        if eu < tau - EPSILON {
            return false;
        }

        // phase 1: fill the first empty slot found.
        for slot in &self.slots {
            if slot.load().is_some() {
                continue;
            }
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let entry = Arc::new(TopKEntry {
                items: items.to_vec(),
                expected_utility: eu,
                probability: prob,
                support,
                inserted_at: seq,
            });
            let mut applied = false;
            slot.rcu(|cur| {
                if cur.is_none() {
                    applied = true;
                    Some(entry.clone())
                } else {
                    applied = false;
                    cur.clone()
                }
            });
            if applied {
                stats.inc_successful_update();
                self.recompute_tau();
                return true;
            }
            stats.add_cas_retries(1);
        }

        // phase 2: duplicate update. Only one slot can match a given
        // itemset at a time, so the first match found is authoritative.
        for slot in &self.slots {
            let existing = match slot.load().as_ref() {
                Some(e) => e.clone(),
                None => continue,
            };
            if !existing.same_itemset(items) {
                continue;
            }
            if eu <= existing.expected_utility + EPSILON {
                return false;
            }
            let expected_seq = existing.inserted_at;
            let merged_prob = existing.probability.max(prob);
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let entry = Arc::new(TopKEntry {
                items: items.to_vec(),
                expected_utility: eu,
                probability: merged_prob,
                support,
                inserted_at: seq,
            });
            let mut applied = false;
            slot.rcu(|cur| match cur.as_ref() {
                Some(e) if e.inserted_at == expected_seq && e.expected_utility < eu - EPSILON => {
                    applied = true;
                    Some(entry.clone())
                }
                _ => {
                    applied = false;
                    cur.clone()
                }
            });
            if applied {
                stats.inc_successful_update();
                self.recompute_tau();
                return true;
            }
            // spec: a lost CAS race on a duplicate gives up rather than
            // retrying — another thread already published an equal-or-better
            // entry for this itemset.
            stats.add_cas_retries(1);
            return false;
        }

        // phase 3: replace the weakest resident entry.
        for _ in 0..crate::MAX_CAS_RETRIES {
            let mut weakest_idx = None;
            let mut weakest_eu = f64::INFINITY;
            let mut weakest_seq = 0u64;
            for (i, slot) in self.slots.iter().enumerate() {
                if let Some(e) = slot.load().as_ref() {
                    if e.expected_utility < weakest_eu {
                        weakest_eu = e.expected_utility;
                        weakest_idx = Some(i);
                        weakest_seq = e.inserted_at;
                    }
                }
            }
            let Some(idx) = weakest_idx else {
                return false;
            };
            if eu <= weakest_eu + EPSILON {
                return false;
            }
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let entry = Arc::new(TopKEntry {
                items: items.to_vec(),
                expected_utility: eu,
                probability: prob,
                support,
                inserted_at: seq,
            });
            let mut applied = false;
            self.slots[idx].rcu(|cur| match cur.as_ref() {
                Some(e) if e.inserted_at == weakest_seq => {
                    applied = true;
                    Some(entry.clone())
                }
                _ => {
                    applied = false;
                    cur.clone()
                }
            });
            if applied {
                stats.inc_successful_update();
                self.recompute_tau();
                return true;
            }
            stats.add_cas_retries(1);
        }
        false
    }

    /// a read snapshot, sorted by the result comparator. Not linearisable
    /// with in-flight `try_add` calls, but never returns a torn entry.
    pub fn get_top_k(&self) -> Vec<TopKEntry> {
        let mut entries: Vec<TopKEntry> = self
            .slots
            .iter()
            .filter_map(|s| s.load().as_ref().map(|e| (**e).clone()))
            .collect();
        entries.sort_by(compare_entries);
        entries
    }

    fn recompute_tau(&self) {
        let mut count = 0usize;
        let mut min_eu = f64::INFINITY;
        for slot in &self.slots {
            if let Some(e) = slot.load().as_ref() {
                count += 1;
                min_eu = min_eu.min(e.expected_utility);
            }
        }
        if count < self.k {
            return;
        }
        let bits = min_eu.to_bits();
        let _ = self
            .tau_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                if min_eu > f64::from_bits(cur) {
                    Some(bits)
                } else {
                    None
                }
            });
    }
}
