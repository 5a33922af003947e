//! Sieving prime generation.
//!
//! The primes up to `sqrt(stop)` come from a second, smaller segmented
//! sieve, which is itself fed by a flat odd-only sieve up to
//! `stop^(1/4)`.

use tracing::debug;

use crate::config::SieveConfig;
use crate::error::Result;
use crate::extract::for_each_prime;
use crate::sieve::{SegmentSink, SegmentedSieve};

/// Odd-only sieve of Eratosthenes returning every prime `<= limit`.
///
/// - `is_prime[i]` represents the number `2 * i + 3`
/// - only odd multiples of odd primes are crossed off
pub fn small_primes(limit: u32) -> Vec<u32> {
    if limit < 2 {
        return vec![];
    }
    let mut primes = vec![2];
    let limit = limit as usize;
    let size = (limit - 1) / 2;
    let mut is_prime = vec![true; size];

    let mut i = 0;
    while i < size {
        let p = 2 * i + 3;
        if p * p > limit {
            break;
        }
        if is_prime[i] {
            let mut j = (p * p - 3) / 2;
            while j < size {
                is_prime[j] = false;
                j += p;
            }
        }
        i += 1;
    }

    for (i, &is_p) in is_prime.iter().enumerate() {
        if is_p {
            primes.push((2 * i + 3) as u32);
        }
    }
    primes
}

struct Collector {
    primes: Vec<u32>,
}

impl SegmentSink for Collector {
    fn process_segment(&mut self, segment: &[u8], low: u64) {
        for_each_prime(segment, low, |p: u32| self.primes.push(p));
    }
}

/// The primes `7 <= p <= sqrt(stop)` in increasing order.
pub fn sieving_primes(stop: u64, config: &SieveConfig) -> Result<Vec<u32>> {
    let limit = stop.isqrt();
    if limit < 7 {
        return Ok(Vec::new());
    }
    let bootstrap = small_primes(limit.isqrt() as u32);
    let mut engine = SegmentedSieve::new(7, limit, &config.bootstrap())?;

    // pi(x) < 1.26 x / ln(x)
    let estimate = (limit as f64 / (limit as f64).ln() * 1.26) as usize;
    let mut collector = Collector {
        primes: Vec::with_capacity(estimate),
    };
    for &p in bootstrap.iter().filter(|&&p| p >= 7) {
        engine.add_sieving_prime(p as u64, &mut collector);
    }
    engine.finish(&mut collector);
    debug!(
        limit,
        bootstrap = bootstrap.len(),
        sieving_primes = collector.primes.len(),
        "generated sieving primes"
    );
    Ok(collector.primes)
}
