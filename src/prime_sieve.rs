//! Sequential prime sieve.

use crate::config::SieveConfig;
use crate::error::{Error, Result};
use crate::extract::TupletClass;
use crate::finder::{Counts, PrimeFinder, small_tuplets};
use crate::generator::sieving_primes;
use crate::nth_prime;
use crate::sieve::SegmentedSieve;

/// Largest supported stop, `2^64 - 1 - (2^32 - 1) * 10`. Segment bounds
/// past `stop` never overflow a `u64` below this value.
pub const MAX_STOP: u64 = u64::MAX - u32::MAX as u64 * 10;

pub fn max_stop() -> u64 {
    MAX_STOP
}

pub(crate) fn check_range(start: u64, stop: u64) -> Result<()> {
    if start > stop {
        return Err(Error::out_of_range(format!("start {} > stop {}", start, stop)));
    }
    if stop > MAX_STOP {
        return Err(Error::out_of_range(format!(
            "stop {} > max stop {}",
            stop, MAX_STOP
        )));
    }
    Ok(())
}

/// Part of an interval sieved by one engine. Values below `count_from`
/// are sieved but not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub sieve_start: u64,
    pub count_from: u64,
    pub stop: u64,
}

impl Chunk {
    /// A chunk without lookbehind, `start >= 7`.
    pub fn new(start: u64, stop: u64) -> Self {
        Self {
            sieve_start: start,
            count_from: start,
            stop,
        }
    }
}

pub(crate) fn sieve_chunk(
    chunk: Chunk,
    primes: &[u32],
    config: &SieveConfig,
    finder: &mut PrimeFinder<'_>,
) -> Result<()> {
    let engine = SegmentedSieve::new(chunk.sieve_start, chunk.stop, config)?;
    engine.sieve(primes, finder);
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct PrimeSieve {
    config: SieveConfig,
}

impl PrimeSieve {
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

    /// Counts the primes or tuplets of `class` inside `[start, stop]`.
    pub fn count(&self, start: u64, stop: u64, class: TupletClass) -> Result<u64> {
        Ok(self.count_all(start, stop, &[class])?.get(class))
    }

    /// Counts several classes with one pass over the interval.
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
        let mut finder = PrimeFinder::counting(classes, start);
        sieve_chunk(Chunk::new(start, stop), &primes, &self.config, &mut finder)?;
        counts += finder.counts();
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

    /// Calls `f` for every prime in `[start, stop]` in increasing order.
    pub fn for_each_prime<F>(&self, start: u64, stop: u64, mut f: F) -> Result<()>
    where
        F: FnMut(u64),
    {
        check_range(start, stop)?;
        for members in small_tuplets(start, stop, TupletClass::Primes) {
            f(members[0]);
        }
        if stop < 7 {
            return Ok(());
        }

        let start = start.max(7);
        let primes = sieving_primes(stop, &self.config)?;
        let mut finder = PrimeFinder::primes(&mut f, start);
        sieve_chunk(Chunk::new(start, stop), &primes, &self.config, &mut finder)
    }

    /// Calls `f` with the members of every tuplet of `class` lying inside
    /// `[start, stop]`.
    pub fn for_each_tuplet<F>(&self, start: u64, stop: u64, class: TupletClass, mut f: F) -> Result<()>
    where
        F: FnMut(&[u64]),
    {
        if class == TupletClass::Primes {
            return self.for_each_prime(start, stop, |p| f(&[p]));
        }
        check_range(start, stop)?;
        for members in small_tuplets(start, stop, class) {
            f(members);
        }
        if stop < 7 {
            return Ok(());
        }

        let start = start.max(7);
        let primes = sieving_primes(stop, &self.config)?;
        let mut finder = PrimeFinder::tuplets(class, &mut f, start);
        sieve_chunk(Chunk::new(start, stop), &primes, &self.config, &mut finder)
    }

    /// Collects the primes inside `[start, stop]`.
    pub fn primes(&self, start: u64, stop: u64) -> Result<Vec<u64>> {
        let mut primes = Vec::new();
        self.for_each_prime(start, stop, |p| primes.push(p))?;
        Ok(primes)
    }

    /// The `n`-th prime `>= start`, `n >= 1`.
    pub fn nth_prime(&self, n: u64, start: u64) -> Result<u64> {
        nth_prime::search(
            n,
            start,
            |low, high| self.count_primes(low, high),
            |low, high, k| self.kth_prime_in(low, high, k),
        )
    }

    /// The `k`-th prime inside `[low, high]`, if there are that many.
    pub(crate) fn kth_prime_in(&self, low: u64, high: u64, k: u64) -> Result<Option<u64>> {
        let mut seen = 0;
        let mut found = None;
        self.for_each_prime(low, high, |p| {
            seen += 1;
            if seen == k {
                found = Some(p);
            }
        })?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::small_primes;

    #[test]
    fn test_count_below_100() {
        let sieve = PrimeSieve::new();
        assert_eq!(sieve.count_primes(2, 100).unwrap(), 25);
        assert_eq!(sieve.count_primes(0, 100).unwrap(), 25);
        assert_eq!(sieve.count_twins(2, 100).unwrap(), 8);
        assert_eq!(sieve.count_primes(0, 1).unwrap(), 0);
        assert_eq!(sieve.count_primes(0, 0).unwrap(), 0);
        assert_eq!(sieve.count_primes(2, 2).unwrap(), 1);
        assert_eq!(sieve.count_primes(4, 6).unwrap(), 1);
    }

    #[test]
    fn test_count_small_tuplets() {
        let sieve = PrimeSieve::new();
        // (5,7,11) (7,11,13) (11,13,17) (13,17,19) (17,19,23)
        assert_eq!(sieve.count_triplets(0, 23).unwrap(), 5);
        // (5,7,11,13) (11,13,17,19)
        assert_eq!(sieve.count_quadruplets(0, 19).unwrap(), 2);
        assert_eq!(sieve.count_quadruplets(6, 19).unwrap(), 1);
        // (5,7,11,13,17) (7,11,13,17,19) (11,13,17,19,23)
        assert_eq!(sieve.count_quintuplets(0, 23).unwrap(), 3);
        // (7,11,13,17,19,23)
        assert_eq!(sieve.count_sextuplets(0, 100).unwrap(), 1);
        // (11,13,17,19,23,29,31)
        assert_eq!(sieve.count_septuplets(0, 31).unwrap(), 1);
        assert_eq!(sieve.count_septuplets(0, 30).unwrap(), 0);
    }

    #[test]
    fn test_million() {
        let sieve = PrimeSieve::new();
        assert_eq!(sieve.count_primes(0, 1_000_000).unwrap(), 78_498);
        let counts = sieve
            .count_all(0, 1_000_000, &[TupletClass::Primes, TupletClass::Twins])
            .unwrap();
        assert_eq!(counts[TupletClass::Primes], 78_498);
        assert_eq!(counts[TupletClass::Twins], 8169);
    }

    #[test]
    fn test_primes_match_flat_sieve() {
        let sieve = PrimeSieve::with_config(SieveConfig::new().sieve_size_kb(1)).unwrap();
        let expected: Vec<u64> = small_primes(500_000).into_iter().map(u64::from).collect();
        assert_eq!(sieve.primes(0, 500_000).unwrap(), expected);
        let tail: Vec<u64> = expected.iter().copied().filter(|&p| p >= 123_457).collect();
        assert_eq!(sieve.primes(123_457, 500_000).unwrap(), tail);
    }

    #[test]
    fn test_for_each_tuplet_lists_members() {
        let sieve = PrimeSieve::new();
        let mut twins = Vec::new();
        sieve
            .for_each_tuplet(0, 32, TupletClass::Twins, |m| twins.push((m[0], m[1])))
            .unwrap();
        assert_eq!(twins, vec![(3, 5), (5, 7), (11, 13), (17, 19), (29, 31)]);
    }

    #[test]
    fn test_nth_prime() {
        let sieve = PrimeSieve::new();
        assert_eq!(sieve.nth_prime(1, 0).unwrap(), 2);
        assert_eq!(sieve.nth_prime(10, 0).unwrap(), 29);
        assert_eq!(sieve.nth_prime(1, 30).unwrap(), 31);
        assert_eq!(sieve.nth_prime(78_498, 0).unwrap(), 999_983);
        assert!(sieve.nth_prime(0, 0).is_err());
    }

    #[test]
    fn test_range_errors() {
        let sieve = PrimeSieve::new();
        assert!(matches!(sieve.count_primes(10, 5), Err(Error::OutOfRange { .. })));
        assert!(matches!(
            sieve.count_primes(0, MAX_STOP + 1),
            Err(Error::OutOfRange { .. })
        ));
        assert!(PrimeSieve::with_config(SieveConfig::new().presieve_limit(29)).is_err());
    }

    #[test]
    fn test_max_stop() {
        assert_eq!(max_stop(), 18_446_744_030_759_878_665);
        assert_eq!(max_stop(), u64::MAX - (u32::MAX as u64) * 10);
    }
}
