//! Sieve configuration.
//!
//! All tuning knobs are passed into the engine at construction time; the
//! defaults are sized for a 32 KB L1 data cache.

use crate::error::{Error, Result};

/// Default segment size in kilobytes (one L1 data cache).
pub const DEFAULT_SIEVE_SIZE_KB: u32 = 32;
/// Largest accepted segment size in kilobytes.
pub const MAX_SIEVE_SIZE_KB: u32 = 8192;
/// Default pre-sieve limit, multiples of 7..=19 are removed up front.
pub const DEFAULT_PRESIEVE_LIMIT: u32 = 19;
/// Pre-sieve limit of the engine that generates the sieving primes.
pub const BOOTSTRAP_PRESIEVE_LIMIT: u32 = 13;
pub const MIN_PRESIEVE_LIMIT: u32 = 11;
pub const MAX_PRESIEVE_LIMIT: u32 = 23;
/// Each thread sieves at least this many integers.
pub const DEFAULT_MIN_THREAD_INTERVAL: u64 = 100_000_000;
pub const MIN_THREAD_INTERVAL: u64 = 100;

/// Number of worker threads for the parallel sieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Threads {
    /// Use every available core.
    #[default]
    All,
    /// Use exactly this many threads (clamped to the core count).
    Count(usize),
}

impl Threads {
    /// Resolves to a concrete thread count.
    pub fn resolve(self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        match self {
            Threads::All => available,
            Threads::Count(n) => n.clamp(1, available),
        }
    }
}

impl From<Option<usize>> for Threads {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Threads::All, Threads::Count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SieveConfig {
    /// Segment size in kilobytes, floored to a power of two.
    pub sieve_size_kb: u32,
    /// Multiples of the primes up to this limit are pre-sieved.
    pub presieve_limit: u32,
    /// Minimum interval length handed to one thread.
    pub min_thread_interval: u64,
    pub threads: Threads,
    /// Sieving primes `<= small_factor * segment bytes` go to the small tier.
    pub small_factor: f64,
    /// Sieving primes `<= medium_factor * segment bytes` go to the medium tier.
    pub medium_factor: u32,
    /// Sieving primes per bucket in the small and medium tiers.
    pub bucket_size: usize,
    /// Sieving primes per bucket in the big tier.
    pub big_bucket_size: usize,
    /// Bytes the big tier allocates whenever it runs out of buckets.
    pub big_memory_per_alloc: usize,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            sieve_size_kb: DEFAULT_SIEVE_SIZE_KB,
            presieve_limit: DEFAULT_PRESIEVE_LIMIT,
            min_thread_interval: DEFAULT_MIN_THREAD_INTERVAL,
            threads: Threads::All,
            small_factor: 1.5,
            medium_factor: 9,
            bucket_size: 1 << 12,
            big_bucket_size: 1 << 10,
            big_memory_per_alloc: 4 << 20,
        }
    }
}

impl SieveConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn sieve_size_kb(mut self, kb: u32) -> Self {
        self.sieve_size_kb = kb;
        self
    }

    #[must_use]
    pub const fn presieve_limit(mut self, limit: u32) -> Self {
        self.presieve_limit = limit;
        self
    }

    #[must_use]
    pub const fn min_thread_interval(mut self, interval: u64) -> Self {
        self.min_thread_interval = interval;
        self
    }

    #[must_use]
    pub const fn threads(mut self, threads: Threads) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub const fn medium_factor(mut self, factor: u32) -> Self {
        self.medium_factor = factor;
        self
    }

    #[must_use]
    pub const fn bucket_sizes(mut self, bucket_size: usize, big_bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self.big_bucket_size = big_bucket_size;
        self
    }

    /// Checks every setting against its documented bounds.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SIEVE_SIZE_KB).contains(&self.sieve_size_kb) {
            return Err(Error::invalid_config(format!(
                "sieve size {} KB not in 1..={}",
                self.sieve_size_kb, MAX_SIEVE_SIZE_KB
            )));
        }
        if !(MIN_PRESIEVE_LIMIT..=MAX_PRESIEVE_LIMIT).contains(&self.presieve_limit) {
            return Err(Error::invalid_config(format!(
                "presieve limit {} not in {}..={}",
                self.presieve_limit, MIN_PRESIEVE_LIMIT, MAX_PRESIEVE_LIMIT
            )));
        }
        if self.min_thread_interval < MIN_THREAD_INTERVAL {
            return Err(Error::invalid_config(format!(
                "minimum thread interval {} is below {}",
                self.min_thread_interval, MIN_THREAD_INTERVAL
            )));
        }
        if self.threads == Threads::Count(0) {
            return Err(Error::invalid_config("thread count must be at least 1"));
        }
        if !(self.small_factor > 0.0 && self.small_factor < 5.0) {
            return Err(Error::invalid_config(format!(
                "small tier factor {} not in (0, 5)",
                self.small_factor
            )));
        }
        if (self.medium_factor as f64) < self.small_factor || self.medium_factor > 64 {
            return Err(Error::invalid_config(format!(
                "medium tier factor {} not in [{}, 64]",
                self.medium_factor, self.small_factor
            )));
        }
        if self.bucket_size == 0 || self.big_bucket_size == 0 {
            return Err(Error::invalid_config("bucket sizes must be non-zero"));
        }
        if self.big_memory_per_alloc < self.big_bucket_size * crate::wheel::WHEEL_PRIME_BYTES {
            return Err(Error::invalid_config(
                "big tier allocation is smaller than one bucket",
            ));
        }
        Ok(())
    }

    /// Segment size in bytes: the configured kilobytes floored to a power of two.
    pub fn segment_bytes(&self) -> usize {
        let kb = self.sieve_size_kb.clamp(1, MAX_SIEVE_SIZE_KB);
        let floored = 1u32 << (31 - kb.leading_zeros());
        floored as usize * 1024
    }

    /// Configuration of the smaller engine that generates sieving primes.
    pub fn bootstrap(&self) -> Self {
        Self {
            presieve_limit: BOOTSTRAP_PRESIEVE_LIMIT,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SieveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segment_bytes(), 32 * 1024);
        assert_eq!(config.presieve_limit, 19);
        assert_eq!(config.medium_factor, 9);
        assert_eq!(config.bucket_size, 4096);
        assert_eq!(config.big_bucket_size, 1024);
    }

    #[test]
    fn test_segment_bytes_floors_to_power_of_two() {
        assert_eq!(SieveConfig::new().sieve_size_kb(1).segment_bytes(), 1024);
        assert_eq!(SieveConfig::new().sieve_size_kb(48).segment_bytes(), 32 * 1024);
        assert_eq!(SieveConfig::new().sieve_size_kb(8192).segment_bytes(), 8192 * 1024);
    }

    #[test]
    fn test_rejects_out_of_bounds_settings() {
        assert!(SieveConfig::new().sieve_size_kb(0).validate().is_err());
        assert!(SieveConfig::new().sieve_size_kb(8193).validate().is_err());
        assert!(SieveConfig::new().presieve_limit(10).validate().is_err());
        assert!(SieveConfig::new().presieve_limit(24).validate().is_err());
        assert!(SieveConfig::new().min_thread_interval(99).validate().is_err());
        assert!(SieveConfig::new().threads(Threads::Count(0)).validate().is_err());
        assert!(SieveConfig::new().bucket_sizes(0, 1024).validate().is_err());
    }

    #[test]
    fn test_accepts_bounds() {
        assert!(SieveConfig::new().presieve_limit(11).validate().is_ok());
        assert!(SieveConfig::new().presieve_limit(23).validate().is_ok());
        assert!(SieveConfig::new().min_thread_interval(100).validate().is_ok());
    }

    #[test]
    fn test_threads_resolve() {
        assert!(Threads::All.resolve() >= 1);
        assert_eq!(Threads::Count(1).resolve(), 1);
        assert!(Threads::Count(10_000).resolve() <= Threads::All.resolve());
        assert_eq!(Threads::from(None), Threads::All);
        assert_eq!(Threads::from(Some(3)), Threads::Count(3));
    }

    #[test]
    fn test_bootstrap_uses_small_presieve() {
        let config = SieveConfig::new().sieve_size_kb(64).bootstrap();
        assert_eq!(config.presieve_limit, BOOTSTRAP_PRESIEVE_LIMIT);
        assert_eq!(config.sieve_size_kb, 64);
    }
}
