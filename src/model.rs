use std::collections::HashMap;

use crate::LOG_EPSILON;

pub type ItemId = u32;
pub type Quantity = u32;
pub type Tid = u32;

/// one line of the uncertain transaction database: a transaction id and the
/// items it contains, each with a quantity and an existence probability.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub tid: Tid,
    pub items: Vec<(ItemId, Quantity, f64)>,
}

impl Transaction {
    pub fn new(tid: Tid, items: Vec<(ItemId, Quantity, f64)>) -> Self {
        Self { tid, items }
    }
}

/// item id -> profit, may be negative. Immutable for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct ProfitTable {
    profits: HashMap<ItemId, f64>,
}

impl ProfitTable {
    pub fn new(profits: HashMap<ItemId, f64>) -> Self {
        Self { profits }
    }

    pub fn get(&self, item: ItemId) -> Option<f64> {
        self.profits.get(&item).copied()
    }

    pub fn len(&self) -> usize {
        self.profits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, f64)> + '_ {
        self.profits.iter().map(|(&i, &p)| (i, p))
    }
}

/// one row of a utility list: a transaction contribution of the current
/// itemset, plus the suffix-remaining positive utility and log-probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilityListElement {
    pub tid: Tid,
    pub u: f64,
    pub r: f64,
    pub lp: f64,
}

/// a utility list for one itemset: tid-sorted elements plus the aggregates
/// computed once at construction time and never touched again.
#[derive(Debug, Clone)]
pub struct UtilityList {
    pub itemset: Vec<ItemId>,
    pub rtwu: f64,
    pub elements: Vec<UtilityListElement>,
    pub sum_eu: f64,
    pub sum_remaining: f64,
    pub exist_prob: f64,
    pub upper_bound: f64,
}

impl UtilityList {
    /// builds a list from raw elements and derives the §3 aggregates in one
    /// pass. `elements` must already be tid-ascending; this is a precondition,
    /// not something this constructor re-sorts for you.
    pub fn new(itemset: Vec<ItemId>, rtwu: f64, elements: Vec<UtilityListElement>) -> Self {
        debug_assert!(
            elements.windows(2).all(|w| w[0].tid < w[1].tid),
            "utility list elements must be strictly tid-ascending"
        );

        let mut sum_eu = 0.0f64;
        let mut sum_remaining = 0.0f64;
        let mut log_sum = 0.0f64;
        for e in &elements {
            sum_eu += e.u * e.lp.exp();
            sum_remaining += e.r;
            log_sum += e.lp;
        }
        let exist_prob = if elements.is_empty() {
            0.0
        } else {
            1.0 - log_sum.exp()
        };
        let upper_bound = sum_eu + sum_remaining;

        Self {
            itemset,
            rtwu,
            elements,
            sum_eu,
            sum_remaining,
            exist_prob,
            upper_bound,
        }
    }

    pub fn last_item(&self) -> ItemId {
        *self.itemset.last().expect("itemset is never empty")
    }

    pub fn qualifies(&self, tau: f64, min_prob: f64, eps: f64) -> bool {
        self.sum_eu >= tau - eps && self.exist_prob >= min_prob - eps
    }
}

/// result entry: items, expected utility, existential probability, support.
#[derive(Debug, Clone, PartialEq)]
pub struct TopKEntry {
    pub items: Vec<ItemId>,
    pub expected_utility: f64,
    pub probability: f64,
    pub support: u32,
    /// monotonically increasing sequence number, used as the final tiebreak
    pub inserted_at: u64,
}

impl TopKEntry {
    pub fn same_itemset(&self, other: &[ItemId]) -> bool {
        self.items.len() == other.len() && {
            let mut a = self.items.clone();
            let mut b = other.to_vec();
            a.sort_unstable();
            b.sort_unstable();
            a == b
        }
    }
}

/// comparator of §3: expectedUtility desc, probability desc, size asc,
/// insertion time asc.
pub fn compare_entries(a: &TopKEntry, b: &TopKEntry) -> std::cmp::Ordering {
    b.expected_utility
        .partial_cmp(&a.expected_utility)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .then_with(|| a.items.len().cmp(&b.items.len()))
        .then_with(|| a.inserted_at.cmp(&b.inserted_at))
}

pub(crate) fn log_prob_is_viable(lp: f64) -> bool {
    lp > LOG_EPSILON
}
