//! Merges two utility lists on shared transaction ids to build the list for
//! the union itemset. Two-pointer linear merge; tid order is an invariant
//! that both inputs and the output must satisfy.
//!
//! No early termination on consecutive tid-misses: an earlier variant of
//! this join bailed out after too many misses in a row, which can drop
//! valid joined elements when the remaining tail still contains matches.
//! That behaviour is deliberately not reproduced here.

use crate::model::{UtilityList, UtilityListElement};
use crate::stats::Stats;
use crate::EPSILON;

/// joins `a` and `b`, which must share the same prefix and differ by a
/// single extension item. Returns `None` to mean "prune this path".
pub fn join(a: &UtilityList, b: &UtilityList, threshold: f64, stats: &Stats) -> Option<UtilityList> {
    let joined_rtwu = a.rtwu.min(b.rtwu);
    if joined_rtwu < threshold - EPSILON {
        return None;
    }

    let mut itemset = a.itemset.clone();
    let last = *b.itemset.last().expect("itemset is never empty");
    if !itemset.contains(&last) {
        itemset.push(last);
    }

    let cap = ((a.elements.len().min(b.elements.len())) / 3).clamp(4, 1024);
    stats.observe_memory((cap * std::mem::size_of::<UtilityListElement>()) as u64);
    let mut elements = Vec::with_capacity(cap);

    let (mut i, mut j) = (0, 0);
    while i < a.elements.len() && j < b.elements.len() {
        let ea = a.elements[i];
        let eb = b.elements[j];
        match ea.tid.cmp(&eb.tid) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let lp = ea.lp + eb.lp;
                if crate::model::log_prob_is_viable(lp) {
                    elements.push(UtilityListElement {
                        tid: ea.tid,
                        u: ea.u + eb.u,
                        r: ea.r.min(eb.r),
                        lp,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }

    if elements.len() <= cap / 3 {
        elements.shrink_to_fit();
    }

    if elements.is_empty() {
        return None;
    }

    Some(UtilityList::new(itemset, joined_rtwu, elements))
}
