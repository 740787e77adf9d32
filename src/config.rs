/// run parameters for a mining context, bundled the way the reference
/// crate bundles its clustering parameters into a single args struct.
#[derive(Debug, Clone)]
pub struct MiningConfig {
    pub k: usize,
    pub min_prob: f64,
    /// enable the optional adaptive RTWU factor from the pruning rules.
    /// baseline behaviour (alpha == 1.0 always) is used when this is false.
    pub adaptive_alpha: bool,
    /// worker thread count for the parallel scheduler; `None` uses
    /// `num_cpus::get()`.
    pub threads: Option<usize>,
}

impl MiningConfig {
    pub fn new(k: usize, min_prob: f64) -> Self {
        Self {
            k,
            min_prob,
            adaptive_alpha: false,
            threads: None,
        }
    }

    pub fn with_adaptive_alpha(mut self, on: bool) -> Self {
        self.adaptive_alpha = on;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self::new(10, 0.0)
    }
}
