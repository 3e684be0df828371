use crate::core::types::Delay;
use serde::{Deserialize, Serialize};

/// How node updates are executed inside a synchronization window.
///
/// The minimum-delay invariant makes per-node processing independent
/// within a window, so both modes produce the same results; `Rayon`
/// runs the per-thread node partitions concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Partitions are processed in thread order on the calling thread.
    Sequential,
    /// Partitions are processed concurrently on the rayon pool.
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// Configuration for simulation execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Length of one synchronization window in steps. Must not exceed
    /// the scheduler's minimum delay; checked when the engine is built.
    pub window_steps: Delay,
    /// Base seed for the per-thread random streams.
    pub base_seed: u64,
    /// Number of execution threads (node partitions and random
    /// streams).
    pub n_threads: usize,
    /// The concurrency mode to use for window execution.
    pub concurrency_mode: ConcurrencyMode,
}

impl SimulationConfig {
    /// Default configuration: single-step windows, one thread,
    /// sequential execution.
    pub fn new() -> Self {
        Self {
            window_steps: 1,
            base_seed: 1234567890,
            n_threads: 1,
            concurrency_mode: ConcurrencyMode::default(),
        }
    }

    pub fn with_window_steps(mut self, window_steps: Delay) -> Self {
        self.window_steps = window_steps;
        self
    }

    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads.max(1);
        self
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.window_steps, 1);
        assert_eq!(config.n_threads, 1);
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Sequential);
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::new()
            .with_window_steps(3)
            .with_base_seed(42)
            .with_threads(4)
            .with_concurrency(ConcurrencyMode::Rayon);

        assert_eq!(config.window_steps, 3);
        assert_eq!(config.base_seed, 42);
        assert_eq!(config.n_threads, 4);
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
    }

    #[test]
    fn test_zero_threads_clamped_to_one() {
        let config = SimulationConfig::new().with_threads(0);
        assert_eq!(config.n_threads, 1);
    }
}
