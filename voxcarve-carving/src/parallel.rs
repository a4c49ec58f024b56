//! Thread pool management for the carving passes
//!
//! Both per-voxel carving and per-point voxelization run on a single global
//! rayon pool. The pool is built on first use with one worker per logical CPU
//! unless [`init_thread_pool`] configured it earlier.

use log::{debug, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex, OnceLock};
use voxcarve_core::{Error, Result};

static GLOBAL_THREAD_POOL: OnceLock<Arc<ThreadPool>> = OnceLock::new();
static THREAD_POOL_CONFIG: Mutex<ThreadPoolConfig> = Mutex::new(ThreadPoolConfig::new());

const DEFAULT_THREAD_PREFIX: &str = "voxcarve-worker";

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of threads to use (None = one per logical CPU)
    pub num_threads: Option<usize>,
    /// Thread stack size in bytes
    pub stack_size: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Enable parallel processing (can be disabled for debugging)
    pub enabled: bool,
    /// Inputs shorter than this are processed on the calling thread
    pub min_parallel_len: usize,
}

impl ThreadPoolConfig {
    const fn new() -> Self {
        Self {
            num_threads: None,
            stack_size: None,
            thread_name_prefix: String::new(),
            enabled: true,
            min_parallel_len: 4096,
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Enable or disable parallel processing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_parallel_len(mut self, len: usize) -> Self {
        self.min_parallel_len = len;
        self
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder =
            ThreadPoolBuilder::new().num_threads(self.num_threads.unwrap_or_else(num_cpus::get));

        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        if !self.thread_name_prefix.is_empty() {
            let prefix = self.thread_name_prefix.clone();
            builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
        }

        builder
            .build()
            .map_err(|e| Error::Algorithm(format!("Failed to create thread pool: {}", e)))
    }
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            ..Self::new()
        }
    }
}

/// Initialize the global thread pool with custom configuration.
///
/// The pool can only be built once per process. Later calls still update
/// `enabled` and `min_parallel_len` but keep the existing workers.
pub fn init_thread_pool(config: ThreadPoolConfig) -> Result<()> {
    if GLOBAL_THREAD_POOL.get().is_none() {
        let pool = config.build_pool()?;
        if GLOBAL_THREAD_POOL.set(Arc::new(pool)).is_ok() {
            debug!(
                "thread pool initialized with {} threads",
                config.num_threads.unwrap_or_else(num_cpus::get)
            );
        }
    } else {
        debug!("thread pool already initialized, keeping its workers");
    }

    if let Ok(mut global_config) = THREAD_POOL_CONFIG.lock() {
        *global_config = config;
    }
    Ok(())
}

/// The global thread pool, built with defaults if needed.
///
/// `None` only when the default pool could not be created; callers then fall
/// back to rayon's implicit global pool.
pub fn thread_pool() -> Option<Arc<ThreadPool>> {
    if let Some(pool) = GLOBAL_THREAD_POOL.get() {
        return Some(pool.clone());
    }
    match ThreadPoolConfig::default().build_pool() {
        Ok(pool) => Some(GLOBAL_THREAD_POOL.get_or_init(|| Arc::new(pool)).clone()),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Get current thread pool configuration
pub fn get_config() -> ThreadPoolConfig {
    THREAD_POOL_CONFIG
        .lock()
        .map(|config| config.clone())
        .unwrap_or_else(|_| ThreadPoolConfig::default())
}

/// Check if parallel processing is enabled
pub fn is_parallel_enabled() -> bool {
    get_config().enabled
}

/// Whether an input of `len` items is worth splitting across workers
pub fn should_parallelize(len: usize) -> bool {
    let config = get_config();
    config.enabled && len >= config.min_parallel_len
}

/// Execute a parallel operation with the global thread pool
pub fn execute_parallel<F, R>(op: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    if !is_parallel_enabled() {
        return op();
    }
    match thread_pool() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_default_config() {
        let config = ThreadPoolConfig::default();
        assert!(config.enabled);
        assert_eq!(config.num_threads, None);
        assert_eq!(config.thread_name_prefix, DEFAULT_THREAD_PREFIX);
    }

    #[test]
    fn test_builder_methods() {
        let config = ThreadPoolConfig::default()
            .with_threads(3)
            .with_stack_size(1 << 20)
            .with_min_parallel_len(10);
        assert_eq!(config.num_threads, Some(3));
        assert_eq!(config.stack_size, Some(1 << 20));
        assert_eq!(config.min_parallel_len, 10);
    }

    #[test]
    fn test_execute_parallel_sums() {
        let data: Vec<u64> = (1..=1000).collect();
        let total: u64 = execute_parallel(|| data.par_iter().sum());
        assert_eq!(total, 500_500);
    }

    #[test]
    fn test_pool_is_available() {
        let pool = thread_pool().unwrap();
        assert!(pool.current_num_threads() >= 1);
    }
}
