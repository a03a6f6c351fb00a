//! Parallel processing configuration
//!
//! Chunk merges fill every cell of the output grid. Above a size threshold that
//! fill runs on Rayon's thread pool; below it the sequential path is cheaper.

use crate::errors::{ChunkerError, Result};
use log::info;
use rayon::ThreadPoolBuilder;

/// Default minimum number of output cells before a merge fill goes parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 16;

/// Configuration for parallel processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
    /// Grids with fewer cells are filled sequentially
    pub parallel_threshold: usize,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self {
            num_threads,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self::new(Some(num_cpus::get()))
    }

    /// Create a configuration that uses a specific number of threads
    pub fn with_threads(num_threads: usize) -> Self {
        Self::new(Some(num_threads))
    }

    /// Never fill in parallel
    pub fn sequential() -> Self {
        Self {
            num_threads: None,
            parallel_threshold: usize::MAX,
        }
    }

    /// Override the parallel fill threshold
    #[must_use]
    pub fn with_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// Whether a grid of `cells` cells should be filled in parallel
    #[must_use]
    pub fn use_parallel(&self, cells: usize) -> bool {
        cells >= self.parallel_threshold
    }

    /// Set up the global Rayon thread pool with the specified configuration
    pub fn setup_global_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    ChunkerError::ThreadPoolError(format!(
                        "Failed to initialize thread pool with {} threads: {}",
                        num_threads, e
                    ))
                })?;

            info!("Configured parallel processing with {} threads", num_threads);
        } else {
            info!("Using default thread pool configuration");
        }

        Ok(())
    }

    /// Get the current number of threads being used
    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self::new(None)
    }
}
