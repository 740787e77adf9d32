pub mod builder;
pub mod config;
pub mod error;
pub mod join;
pub mod loader;
pub mod model;
pub mod prune;
pub mod scheduler;
pub mod search;
pub mod stats;
pub mod topk;

pub use config::MiningConfig;
pub use error::{MiningError, MiningResult};
pub use model::{ItemId, ProfitTable, Transaction, TopKEntry};
pub use stats::Stats;

/// floating point equality guard used throughout the pruning and join logic
pub const EPSILON: f64 = 1e-10;

/// below this log-probability an element's contribution underflows to zero
pub const LOG_EPSILON: f64 = -700.0;

/// CAS retry budget for a single top-k slot update before giving up
pub const MAX_CAS_RETRIES: usize = 100;

/// minimum number of top-level items before the scheduler engages the pool
pub const PARALLEL_THRESHOLD: usize = 30;

/// task-splitting granularity for the work-stealing prefix scheduler
pub const TASK_GRANULARITY: usize = 7;

/// initialize combined terminal + file logging, mirroring the CLI's needs
#[cfg(feature = "cli")]
pub fn init_logging() -> anyhow::Result<()> {
    use anyhow::Context;

    std::fs::create_dir_all("logs").context("create logs directory")?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .context("time moves slow")?
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).context("create log file")?,
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).context("initialize logger")?;
    Ok(())
}
