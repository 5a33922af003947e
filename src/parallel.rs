//! Parallel prime sieve.
//!
//! The interval is split into one chunk per thread. Every chunk runs its
//! own segmented sieve on a scoped thread; the sieving primes are generated
//! once and borrowed by all of them. Counts are summed after joining.

use std::thread;

use tracing::debug;

use crate::config::SieveConfig;
use crate::error::Result;
use crate::extract::TupletClass;
use crate::finder::{Counts, PrimeFinder, small_tuplets};
use crate::generator::sieving_primes;
use crate::nth_prime;
use crate::prime_sieve::{Chunk, PrimeSieve, check_range, sieve_chunk};

/// Splits `[start, stop]` (`start >= 7`) into at most `threads` chunks of
/// at least `min_interval` integers.
///
/// Chunk boundaries are `≡ 2 (mod 30)`, the first value of a sieve byte.
/// Every chunk but the first sieves the byte before its boundary as well,
/// so the tuplets crossing the boundary are found by that chunk.
pub fn partition(start: u64, stop: u64, threads: usize, min_interval: u64) -> Vec<Chunk> {
    let span = stop - start;
    let threads = (threads.max(1) as u64).min((span / min_interval.max(1)).max(1));
    let interval = span / threads;

    let mut chunks = Vec::with_capacity(threads as usize);
    let mut current = Chunk::new(start, stop);
    for i in 1..threads {
        let x = start + interval * i;
        let boundary = x - x % 30 + 2;
        if boundary <= current.count_from + 30 || boundary > stop {
            continue;
        }
        current.stop = boundary - 1;
        chunks.push(current);
        current = Chunk {
            sieve_start: boundary - 30,
            count_from: boundary,
            stop,
        };
    }
    chunks.push(current);
    chunks
}

#[derive(Debug, Clone, Default)]
pub struct ParallelPrimeSieve {
    config: SieveConfig,
}

impl ParallelPrimeSieve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SieveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    /// Number of threads a call over `[start, stop]` would use.
    pub fn threads_for(&self, start: u64, stop: u64) -> usize {
        if stop < 7 || start > stop {
            return 1;
        }
        let start = start.max(7);
        partition(start, stop, self.config.threads.resolve(), self.config.min_thread_interval).len()
    }

    fn chunks(&self, start: u64, stop: u64) -> Vec<Chunk> {
        let chunks = partition(start, stop, self.config.threads.resolve(), self.config.min_thread_interval);
        debug!(start, stop, threads = chunks.len(), "partitioned interval");
        chunks
    }

    pub fn count(&self, start: u64, stop: u64, class: TupletClass) -> Result<u64> {
        Ok(self.count_all(start, stop, &[class])?.get(class))
    }

    pub fn count_all(&self, start: u64, stop: u64, classes: &[TupletClass]) -> Result<Counts> {
        check_range(start, stop)?;
        let mut counts = Counts::default();
        for &class in classes {
            counts.add(class, small_tuplets(start, stop, class).count() as u64);
        }
        if stop < 7 {
            return Ok(counts);
        }

        let start = start.max(7);
        let primes = sieving_primes(stop, &self.config)?;
        let chunks = self.chunks(start, stop);
        let primes = primes.as_slice();
        let config = &self.config;

        let partial: Vec<Result<Counts>> = thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .iter()
                .map(|&chunk| {
                    scope.spawn(move || -> Result<Counts> {
                        let mut finder = PrimeFinder::counting(classes, chunk.count_from);
                        sieve_chunk(chunk, primes, config, &mut finder)?;
                        Ok(finder.counts())
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });
        for chunk_counts in partial {
            counts += chunk_counts?;
        }
        Ok(counts)
    }

    pub fn count_primes(&self, start: u64, stop: u64) -> Result<u64> {
        self.count(start, stop, TupletClass::Primes)
    }

    pub fn count_twins(&self, start: u64, stop: u64) -> Result<u64> {
        self.count(start, stop, TupletClass::Twins)
    }

    pub fn count_triplets(&self, start: u64, stop: u64) -> Result<u64> {
        self.count(start, stop, TupletClass::Triplets)
    }

    pub fn count_quadruplets(&self, start: u64, stop: u64) -> Result<u64> {
        self.count(start, stop, TupletClass::Quadruplets)
    }

    pub fn count_quintuplets(&self, start: u64, stop: u64) -> Result<u64> {
        self.count(start, stop, TupletClass::Quintuplets)
    }

    pub fn count_sextuplets(&self, start: u64, stop: u64) -> Result<u64> {
        self.count(start, stop, TupletClass::Sextuplets)
    }

    pub fn count_septuplets(&self, start: u64, stop: u64) -> Result<u64> {
        self.count(start, stop, TupletClass::Septuplets)
    }

    /// Calls `f(prime, worker)` for every prime in `[start, stop]`.
    ///
    /// Primes arrive in increasing order within one worker only; `f` is
    /// called concurrently from all workers.
    pub fn for_each_prime<F>(&self, start: u64, stop: u64, f: F) -> Result<()>
    where
        F: Fn(u64, usize) + Sync,
    {
        check_range(start, stop)?;
        if stop < 7 {
            for members in small_tuplets(start, stop, TupletClass::Primes) {
                f(members[0], 0);
            }
            return Ok(());
        }

        let small_start = start;
        let start = start.max(7);
        let primes = sieving_primes(stop, &self.config)?;
        let chunks = self.chunks(start, stop);
        let primes = primes.as_slice();
        let config = &self.config;
        let f = &f;

        let results: Vec<Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .iter()
                .enumerate()
                .map(|(worker, &chunk)| {
                    scope.spawn(move || {
                        if worker == 0 {
                            for members in small_tuplets(small_start, stop, TupletClass::Primes) {
                                f(members[0], 0);
                            }
                        }
                        let mut emit = |p: u64| f(p, worker);
                        let mut finder = PrimeFinder::primes(&mut emit, chunk.count_from);
                        sieve_chunk(chunk, primes, config, &mut finder)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });
        results.into_iter().collect()
    }

    /// The `n`-th prime `>= start`, counting in parallel.
    pub fn nth_prime(&self, n: u64, start: u64) -> Result<u64> {
        let sequential = PrimeSieve::with_config(self.config.clone())?;
        nth_prime::search(
            n,
            start,
            |low, high| self.count_primes(low, high),
            |low, high, k| sequential.kth_prime_in(low, high, k),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Threads;
    use std::sync::Mutex;

    fn sieve(threads: usize) -> ParallelPrimeSieve {
        ParallelPrimeSieve::with_config(
            SieveConfig::new()
                .threads(Threads::Count(threads))
                .min_thread_interval(1000),
        )
        .unwrap()
    }

    #[test]
    fn test_partition_boundaries() {
        let chunks = partition(7, 1_000_000, 4, 1000);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].sieve_start, 7);
        assert_eq!(chunks[0].count_from, 7);
        assert_eq!(chunks[3].stop, 1_000_000);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].count_from % 30, 2);
            assert_eq!(pair[1].sieve_start, pair[1].count_from - 30);
            assert_eq!(pair[0].stop + 1, pair[1].count_from);
        }
    }

    #[test]
    fn test_partition_respects_min_interval() {
        assert_eq!(partition(7, 5000, 16, 1000).len(), 4);
        assert_eq!(partition(7, 500, 16, 1000).len(), 1);
        assert_eq!(partition(100, 100, 8, 100).len(), 1);
        assert_eq!(partition(7, 1_000_000, 0, 100), vec![Chunk::new(7, 1_000_000)]);
        // boundaries closer than one byte are merged
        let chunks = partition(7, 107, 8, 1);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].count_from, 62);
    }

    fn count_in_chunks(start: u64, stop: u64, threads: usize, min_interval: u64) -> Counts {
        let config = SieveConfig::new();
        let primes = sieving_primes(stop, &config).unwrap();
        let chunks = partition(start, stop, threads, min_interval);
        assert!(chunks.len() > 1, "[{}, {}] split into one chunk", start, stop);
        let mut total = Counts::default();
        for chunk in chunks {
            let mut finder = PrimeFinder::counting(&TupletClass::ALL, chunk.count_from);
            sieve_chunk(chunk, &primes, &config, &mut finder).unwrap();
            total += finder.counts();
        }
        total
    }

    #[test]
    fn test_chunk_boundaries_keep_counts() {
        // runs the chunks one after the other so the result does not
        // depend on the number of cores
        let sequential = PrimeSieve::new();
        // [5600, 5700] splits at 5642, inside the septuplet 5639..=5659
        for (start, stop, min_interval) in [
            (5600, 5700, 1),
            (7, 10_000, 100),
            (1_000_000, 1_050_000, 100),
            (10_000_000_000, 10_000_100_000, 100),
        ] {
            let expected = sequential.count_all(start, stop, &TupletClass::ALL).unwrap();
            for threads in [2, 3, 8] {
                assert_eq!(
                    count_in_chunks(start, stop, threads, min_interval),
                    expected,
                    "[{}, {}] {} chunks",
                    start,
                    stop,
                    threads
                );
            }
        }
        assert_eq!(sequential.count_septuplets(5600, 5700).unwrap(), 1);
    }

    #[test]
    fn test_count_matches_sequential() {
        let sequential = PrimeSieve::new();
        let expected = sequential
            .count_all(0, 2_000_000, &TupletClass::ALL)
            .unwrap();
        for threads in [1, 2, 8] {
            let counts = sieve(threads)
                .count_all(0, 2_000_000, &TupletClass::ALL)
                .unwrap();
            assert_eq!(counts, expected, "threads {}", threads);
        }
    }

    #[test]
    fn test_for_each_prime_covers_interval() {
        let found = Mutex::new(Vec::new());
        sieve(4)
            .for_each_prime(0, 300_000, |p, _| found.lock().unwrap().push(p))
            .unwrap();
        let mut found = found.into_inner().unwrap();
        found.sort_unstable();
        assert_eq!(found, PrimeSieve::new().primes(0, 300_000).unwrap());
    }

    #[test]
    fn test_nth_prime_matches_sequential() {
        let parallel = sieve(4);
        assert_eq!(parallel.nth_prime(1, 0).unwrap(), 2);
        assert_eq!(parallel.nth_prime(10, 0).unwrap(), 29);
        assert_eq!(
            parallel.nth_prime(1_000_000, 0).unwrap(),
            PrimeSieve::new().nth_prime(1_000_000, 0).unwrap()
        );
    }
}
