//! Command-line entry point for top-k high-utility itemset mining over an
//! uncertain transaction database.

use std::fs::File;
use std::io::BufReader;

use anyhow::Context as _;
use clap::Parser;

use huim_miner::{init_logging, MiningConfig};

#[derive(Parser)]
#[command(author, version, about = "Mine top-k high-utility itemsets from an uncertain database")]
struct Args {
    /// path to the profit table (one "item profit" pair per line)
    #[arg(long, required = true)]
    profits: String,

    /// path to the uncertain transaction database
    #[arg(long, required = true)]
    database: String,

    /// number of itemsets to report
    #[arg(long, default_value_t = 10)]
    k: usize,

    /// minimum existential probability an itemset must meet to be reported
    #[arg(long, default_value_t = 0.0)]
    min_prob: f64,

    /// worker thread count; defaults to the number of logical cores
    #[arg(long)]
    threads: Option<usize>,

    /// enable the adaptive RTWU pruning factor
    #[arg(long, default_value_t = false)]
    adaptive_alpha: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging().context("initialize logging")?;

    let profits_file = BufReader::new(
        File::open(&args.profits).with_context(|| format!("open profit table {}", args.profits))?,
    );
    let profits = huim_miner::loader::load_profits(profits_file).context("parse profit table")?;

    let database_file = BufReader::new(
        File::open(&args.database).with_context(|| format!("open database {}", args.database))?,
    );
    let database = huim_miner::loader::load_database(database_file).context("parse database")?;

    let config = MiningConfig::new(args.k, args.min_prob)
        .with_adaptive_alpha(args.adaptive_alpha);
    let config = match args.threads {
        Some(t) => config.with_threads(t),
        None => config,
    };

    let run = huim_miner::scheduler::run(&database, &profits, &config)?;

    println!("found {} itemset(s):", run.results.len());
    for (rank, entry) in run.results.iter().enumerate() {
        let mut items = entry.items.clone();
        items.sort_unstable();
        println!(
            "{:>3}. {:?}  eu={:.4}  prob={:.4}  support={}",
            rank + 1,
            items,
            entry.expected_utility,
            entry.probability,
            entry.support
        );
    }
    log::info!("{}", run.stats.summary());

    Ok(())
}
