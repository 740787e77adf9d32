//! Single-item utility-list construction with the suffix-sum optimisation.
//!
//! Builds `itemRTWU`, the item rank, and one utility list per surviving
//! item from a raw database and profit table in two linear passes.

use std::collections::HashMap;

use crate::error::{MiningError, MiningResult};
use crate::model::{ItemId, ProfitTable, Quantity, Transaction, UtilityList, UtilityListElement};
use crate::EPSILON;

/// item -> rank position in the ascending-RTWU order.
pub type ItemRank = HashMap<ItemId, usize>;

pub struct BuildOutput {
    pub item_rtwu: HashMap<ItemId, f64>,
    pub item_rank: ItemRank,
    /// items in rank order, ascending
    pub ranked_items: Vec<ItemId>,
    pub single_item_lists: HashMap<ItemId, UtilityList>,
}

/// validates the §7 `InvalidInput` cases before any mining work starts.
pub fn validate(database: &[Transaction], profits: &ProfitTable, k: usize, min_prob: f64) -> MiningResult<()> {
    if database.is_empty() {
        return Err(MiningError::InvalidInput("database is empty".into()));
    }
    if profits.is_empty() {
        return Err(MiningError::InvalidInput("profit table is empty".into()));
    }
    if k == 0 {
        return Err(MiningError::InvalidInput("k must be >= 1".into()));
    }
    if !(0.0..=1.0).contains(&min_prob) {
        return Err(MiningError::InvalidInput(format!(
            "minProb must be in [0,1], got {min_prob}"
        )));
    }
    for t in database {
        if t.items.is_empty() {
            return Err(MiningError::InvalidInput(format!(
                "transaction {} has no items",
                t.tid
            )));
        }
        for &(item, qty, prob) in &t.items {
            if qty == 0 {
                return Err(MiningError::InvalidInput(format!(
                    "transaction {} item {} has non-positive quantity",
                    t.tid, item
                )));
            }
            if !(0.0..=1.0).contains(&prob) {
                return Err(MiningError::InvalidInput(format!(
                    "transaction {} item {} has probability {} outside [0,1]",
                    t.tid, item, prob
                )));
            }
        }
    }
    Ok(())
}

/// RTU(t) = sum over items in t of max(profit, 0) * quantity.
fn transaction_rtu(t: &Transaction, profits: &ProfitTable) -> f64 {
    t.items
        .iter()
        .filter_map(|&(item, qty, _)| profits.get(item).map(|p| p.max(0.0) * qty as f64))
        .sum()
}

/// computes RTWU for every item with probability > 0 across the database.
fn compute_rtwu(database: &[Transaction], profits: &ProfitTable) -> HashMap<ItemId, f64> {
    let mut rtwu: HashMap<ItemId, f64> = HashMap::new();
    for t in database {
        let rtu = transaction_rtu(t, profits);
        for &(item, _, prob) in &t.items {
            if prob > 0.0 {
                *rtwu.entry(item).or_insert(0.0) += rtu;
            }
        }
    }
    rtwu
}

/// sorts items ascending by (rtwu, item-id) and assigns rank positions.
fn rank_items(item_rtwu: &HashMap<ItemId, f64>) -> (ItemRank, Vec<ItemId>) {
    let mut items: Vec<ItemId> = item_rtwu.keys().copied().collect();
    items.sort_by(|&a, &b| {
        item_rtwu[&a]
            .partial_cmp(&item_rtwu[&b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    let rank: ItemRank = items.iter().enumerate().map(|(i, &item)| (item, i)).collect();
    (rank, items)
}

/// per-transaction suffix-sum pass: keeps only ranked, probability>0 items,
/// sorts by rank, and appends a row to each surviving item's builder list.
fn suffix_sum_pass(
    database: &[Transaction],
    profits: &ProfitTable,
    rank: &ItemRank,
) -> HashMap<ItemId, Vec<UtilityListElement>> {
    let mut rows: HashMap<ItemId, Vec<UtilityListElement>> = HashMap::new();

    for t in database {
        let mut present: Vec<(usize, ItemId, Quantity, f64)> = t
            .items
            .iter()
            .filter(|&&(item, _, prob)| prob > 0.0 && rank.contains_key(&item))
            .map(|&(item, qty, prob)| (rank[&item], item, qty, prob))
            .collect();
        present.sort_by_key(|&(r, ..)| r);

        let n = present.len();
        if n == 0 {
            continue;
        }
        let mut suffix = vec![0.0f64; n];
        for i in (0..n - 1).rev() {
            let (_, item, qty, _) = present[i + 1];
            let profit = profits.get(item).unwrap_or(0.0);
            suffix[i] = suffix[i + 1] + profit.max(0.0) * qty as f64;
        }

        for (i, &(_, item, qty, prob)) in present.iter().enumerate() {
            let lp = prob.ln();
            if !crate::model::log_prob_is_viable(lp) {
                continue;
            }
            let profit = profits.get(item).unwrap_or(0.0);
            rows.entry(item).or_default().push(UtilityListElement {
                tid: t.tid,
                u: profit * qty as f64,
                r: suffix[i],
                lp,
            });
        }
    }

    rows
}

/// builds the single-item utility lists, rank, and RTWU maps.
pub fn build(
    database: &[Transaction],
    profits: &ProfitTable,
    k: usize,
    min_prob: f64,
) -> MiningResult<BuildOutput> {
    validate(database, profits, k, min_prob)?;

    let item_rtwu = compute_rtwu(database, profits);
    let (item_rank, ranked_items) = rank_items(&item_rtwu);
    let mut rows = suffix_sum_pass(database, profits, &item_rank);

    let mut single_item_lists = HashMap::new();
    for &item in &ranked_items {
        let Some(mut elements) = rows.remove(&item) else {
            continue;
        };
        elements.sort_by_key(|e| e.tid);
        let rtwu = item_rtwu[&item];
        let list = UtilityList::new(vec![item], rtwu, elements);
        if list.exist_prob < min_prob - EPSILON {
            log::debug!(
                "item {item} dropped: existProb {:.4} < minProb {min_prob:.4}",
                list.exist_prob
            );
            continue;
        }
        single_item_lists.insert(item, list);
    }

    log::info!(
        "built {} single-item utility lists from {} transactions, {} items ranked",
        single_item_lists.len(),
        database.len(),
        ranked_items.len()
    );

    Ok(BuildOutput {
        item_rtwu,
        item_rank,
        ranked_items,
        single_item_lists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn profits(pairs: &[(ItemId, f64)]) -> ProfitTable {
        ProfitTable::new(pairs.iter().copied().collect::<HashMap<_, _>>())
    }

    #[test]
    fn scenario_a_single_item_qualifier() {
        let database = vec![Transaction::new(
            1,
            vec![(1, 2, 0.9), (2, 4, 0.8)],
        )];
        let profits = profits(&[(1, 5.0), (2, 10.0)]);
        let out = build(&database, &profits, 1, 0.5).unwrap();

        let l1 = &out.single_item_lists[&1];
        assert!((l1.sum_eu - 9.0).abs() < 1e-9);
        assert!((l1.exist_prob - 0.9).abs() < 1e-9);

        let l2 = &out.single_item_lists[&2];
        assert!((l2.sum_eu - 32.0).abs() < 1e-9);
        assert!((l2.exist_prob - 0.8).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_database() {
        let profits = profits(&[(1, 5.0)]);
        let err = build(&[], &profits, 1, 0.0).unwrap_err();
        assert!(matches!(err, MiningError::InvalidInput(_)));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let database = vec![Transaction::new(1, vec![(1, 1, 1.5)])];
        let profits = profits(&[(1, 5.0)]);
        let err = build(&database, &profits, 1, 0.0).unwrap_err();
        assert!(matches!(err, MiningError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let database = vec![Transaction::new(1, vec![(1, 0, 1.0)])];
        let profits = profits(&[(1, 5.0)]);
        let err = build(&database, &profits, 1, 0.0).unwrap_err();
        assert!(matches!(err, MiningError::InvalidInput(_)));
    }

    #[test]
    fn drops_items_below_min_prob() {
        let database = vec![Transaction::new(1, vec![(1, 1, 0.2)])];
        let profits = profits(&[(1, 5.0)]);
        let out = build(&database, &profits, 1, 0.5).unwrap();
        assert!(!out.single_item_lists.contains_key(&1));
    }

    #[test]
    fn elements_are_tid_ascending() {
        let database = vec![
            Transaction::new(2, vec![(1, 1, 1.0)]),
            Transaction::new(1, vec![(1, 1, 1.0)]),
            Transaction::new(3, vec![(1, 1, 1.0)]),
        ];
        let profits = profits(&[(1, 5.0)]);
        let out = build(&database, &profits, 1, 0.0).unwrap();
        let l = &out.single_item_lists[&1];
        assert!(l.elements.windows(2).all(|w| w[0].tid < w[1].tid));
    }
}
