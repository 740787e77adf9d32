//! Thin text-format readers for the profit table and transaction database.
//!
//! Neither format is part of the mining core's contract — a caller is free
//! to build `ProfitTable`/`Transaction` values any other way. This module
//! exists only because the CLI binary needs *some* on-disk representation,
//! and a plain line-oriented format is the least surprising choice.
//!
//! Profit table: one `item profit` pair per line, whitespace-separated.
//! Transaction database: one transaction per line,
//! `tid item:qty:prob item:qty:prob ...`.
//! Blank lines and lines starting with `#` are ignored in both formats.

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::{MiningError, MiningResult};
use crate::model::{ItemId, ProfitTable, Transaction};

fn is_skippable(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('#')
}

/// parses a profit table from any line source (a file, a cursor over a
/// string, stdin — anything that implements `BufRead`).
pub fn load_profits<R: BufRead>(reader: R) -> MiningResult<ProfitTable> {
    let mut profits: HashMap<ItemId, f64> = HashMap::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MiningError::InvalidInput(format!("read error: {e}")))?;
        if is_skippable(&line) {
            continue;
        }
        let mut parts = line.split_whitespace();
        let item = parts
            .next()
            .ok_or_else(|| malformed("profit", lineno, &line))?
            .parse::<ItemId>()
            .map_err(|_| malformed("profit", lineno, &line))?;
        let profit = parts
            .next()
            .ok_or_else(|| malformed("profit", lineno, &line))?
            .parse::<f64>()
            .map_err(|_| malformed("profit", lineno, &line))?;
        if parts.next().is_some() {
            return Err(malformed("profit", lineno, &line));
        }
        if profits.insert(item, profit).is_some() {
            return Err(MiningError::InvalidInput(format!(
                "profit table line {}: duplicate entry for item {item}",
                lineno + 1
            )));
        }
    }
    if profits.is_empty() {
        return Err(MiningError::InvalidInput("profit table is empty".into()));
    }
    Ok(ProfitTable::new(profits))
}

/// parses an uncertain transaction database from any line source.
pub fn load_database<R: BufRead>(reader: R) -> MiningResult<Vec<Transaction>> {
    let mut out = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MiningError::InvalidInput(format!("read error: {e}")))?;
        if is_skippable(&line) {
            continue;
        }
        let mut fields = line.split_whitespace();
        let tid = fields
            .next()
            .ok_or_else(|| malformed("transaction", lineno, &line))?
            .parse::<u32>()
            .map_err(|_| malformed("transaction", lineno, &line))?;

        let mut items = Vec::new();
        for field in fields {
            let mut parts = field.splitn(3, ':');
            let item = parts
                .next()
                .ok_or_else(|| malformed("transaction", lineno, &line))?
                .parse::<ItemId>()
                .map_err(|_| malformed("transaction", lineno, &line))?;
            let qty = parts
                .next()
                .ok_or_else(|| malformed("transaction", lineno, &line))?
                .parse::<u32>()
                .map_err(|_| malformed("transaction", lineno, &line))?;
            let prob = parts
                .next()
                .ok_or_else(|| malformed("transaction", lineno, &line))?
                .parse::<f64>()
                .map_err(|_| malformed("transaction", lineno, &line))?;
            items.push((item, qty, prob));
        }
        if items.is_empty() {
            return Err(MiningError::InvalidInput(format!(
                "transaction database line {}: transaction {tid} has no items",
                lineno + 1
            )));
        }
        out.push(Transaction::new(tid, items));
    }
    if out.is_empty() {
        return Err(MiningError::InvalidInput(
            "transaction database is empty".into(),
        ));
    }
    Ok(out)
}

fn malformed(kind: &str, lineno: usize, line: &str) -> MiningError {
    MiningError::InvalidInput(format!(
        "{kind} database line {}: malformed entry {line:?}",
        lineno + 1
    ))
}
