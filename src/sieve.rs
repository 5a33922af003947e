//! Segmented sieve of Eratosthenes.
//!
//! The engine sieves `[start, stop]` one cache-sized segment at a time.
//! Sieving primes are fed in increasing order with
//! [`SegmentedSieve::add_sieving_prime`]; before a prime is stored, every
//! segment below its square is finished and handed to the [`SegmentSink`].
//! This keeps the big tier's ring short and lets the prime generator and the
//! main sieve run interleaved.

use tracing::debug;

use crate::config::SieveConfig;
use crate::erat_big::EratBig;
use crate::erat_medium::EratMedium;
use crate::erat_small::EratSmall;
use crate::error::{Error, Result};
use crate::presieve::PreSieve;
use crate::prime_sieve::MAX_STOP;
use crate::wheel::{BIT_VALUES, NUMBERS_PER_BYTE, first_multiple, locate};

/// Receives finished segments. Bit `j` of byte `i` is set when
/// `low + 30 * i + BIT_VALUES[j]` is prime.
pub trait SegmentSink {
    fn process_segment(&mut self, segment: &[u8], low: u64);
}

impl<F: FnMut(&[u8], u64)> SegmentSink for F {
    fn process_segment(&mut self, segment: &[u8], low: u64) {
        self(segment, low)
    }
}

pub struct SegmentedSieve {
    start: u64,
    stop: u64,
    /// Lower bound of the current segment, a multiple of 30.
    low: u64,
    segment: Vec<u8>,
    presieve: PreSieve,
    small: EratSmall,
    medium: EratMedium,
    big: Option<EratBig>,
    max_prime: u64,
}

impl SegmentedSieve {
    /// Sieves `[start, stop]` with `start >= 7`. Numbers below 7 are not
    /// representable in the modulo 30 encoding.
    pub fn new(start: u64, stop: u64, config: &SieveConfig) -> Result<Self> {
        config.validate()?;
        if start < 7 {
            return Err(Error::out_of_range(format!("start {} < 7", start)));
        }
        if start > stop {
            return Err(Error::out_of_range(format!("start {} > stop {}", start, stop)));
        }
        if stop > MAX_STOP {
            return Err(Error::out_of_range(format!(
                "stop {} > max stop {}",
                stop, MAX_STOP
            )));
        }

        let low = (start - 2) / NUMBERS_PER_BYTE * NUMBERS_PER_BYTE;
        let needed = ((stop - low) / NUMBERS_PER_BYTE + 1) as usize;
        let segment_bytes = config.segment_bytes().min(needed.next_power_of_two());

        let max_prime = stop.isqrt();
        let small_limit = (config.small_factor * segment_bytes as f64) as u64;
        let medium_limit = config.medium_factor as u64 * segment_bytes as u64;
        let big = (max_prime > medium_limit).then(|| {
            EratBig::new(
                segment_bytes,
                medium_limit,
                max_prime,
                config.big_bucket_size,
                config.big_memory_per_alloc,
            )
        });
        debug!(
            start,
            stop, segment_bytes, small_limit, medium_limit, max_prime, "segmented sieve"
        );

        Ok(Self {
            start,
            stop,
            low,
            segment: vec![0u8; segment_bytes],
            presieve: PreSieve::new(config.presieve_limit),
            small: EratSmall::new(small_limit, config.bucket_size),
            medium: EratMedium::new(small_limit, medium_limit, config.bucket_size),
            big,
            max_prime,
        })
    }

    pub fn segment_bytes(&self) -> usize {
        self.segment.len()
    }

    /// Sieving primes stored per tier (small, medium, big).
    pub fn tier_sizes(&self) -> (usize, usize, usize) {
        (
            self.small.len(),
            self.medium.len(),
            self.big.as_ref().map_or(0, EratBig::len),
        )
    }

    fn segment_high(&self) -> u64 {
        self.low + NUMBERS_PER_BYTE * self.segment.len() as u64 + 1
    }

    fn is_done(&self) -> bool {
        self.low + 7 > self.stop
    }

    /// Adds the next sieving prime. Primes must come in increasing order and
    /// must not exceed `sqrt(stop)`.
    pub fn add_sieving_prime<S>(&mut self, prime: u64, sink: &mut S)
    where
        S: SegmentSink + ?Sized,
    {
        assert!(
            prime <= self.max_prime,
            "sieving prime {} > sqrt(stop) {}",
            prime,
            self.max_prime
        );
        if prime <= self.presieve.limit() as u64 {
            return;
        }
        let square = prime * prime;
        while square > self.segment_high() && !self.is_done() {
            self.sieve_segment(sink);
        }

        let Some((multiple_index, wheel_index)) =
            first_multiple(prime, self.start, self.stop, self.low)
        else {
            return;
        };
        if prime <= self.small.limit() {
            self.small.add(prime, multiple_index, wheel_index);
        } else if prime <= self.medium.limit() {
            self.medium.add(prime, multiple_index, wheel_index);
        } else if let Some(big) = self.big.as_mut() {
            big.add(prime, multiple_index, wheel_index);
        }
    }

    /// Sieves the remaining segments.
    pub fn finish<S>(&mut self, sink: &mut S)
    where
        S: SegmentSink + ?Sized,
    {
        while !self.is_done() {
            self.sieve_segment(sink);
        }
    }

    /// Feeds all of `primes` (increasing, `<= sqrt(stop)`) and finishes.
    pub fn sieve<S>(mut self, primes: &[u32], sink: &mut S)
    where
        S: SegmentSink + ?Sized,
    {
        let max_prime = self.max_prime;
        for &prime in primes.iter().take_while(|&&p| p as u64 <= max_prime) {
            self.add_sieving_prime(prime as u64, sink);
        }
        self.finish(sink);
    }

    fn sieve_segment<S>(&mut self, sink: &mut S)
    where
        S: SegmentSink + ?Sized,
    {
        let low = self.low;
        self.presieve.apply(&mut self.segment, low);
        self.restore_presieve_primes();
        self.small.cross_off(&mut self.segment);
        self.medium.cross_off(&mut self.segment);
        if let Some(big) = self.big.as_mut() {
            big.cross_off(&mut self.segment);
        }
        let valid = self.clear_outside();
        sink.process_segment(&self.segment[..valid], low);
        self.low += NUMBERS_PER_BYTE * self.segment.len() as u64;
    }

    /// The pattern also clears the pre-sieved primes themselves.
    fn restore_presieve_primes(&mut self) {
        let high = self.segment_high();
        for &prime in self.presieve.primes() {
            if prime >= self.low + 7 && prime <= high {
                if let Some((byte, bit)) = locate(prime, self.low) {
                    self.segment[byte] |= 1 << bit;
                }
            }
        }
    }

    /// Clears the bits below `start` and above `stop`, returns the number
    /// of bytes holding values `<= stop`.
    fn clear_outside(&mut self) -> usize {
        let low = self.low;
        if self.start >= low + 7 {
            for (i, byte) in self.segment.iter_mut().enumerate() {
                let byte_low = low + NUMBERS_PER_BYTE * i as u64;
                if byte_low + 7 >= self.start {
                    break;
                }
                for (bit, &offset) in BIT_VALUES.iter().enumerate() {
                    if byte_low + offset < self.start {
                        *byte &= !(1 << bit);
                    }
                }
            }
        }

        if self.stop < low + 7 {
            return 0;
        }
        let valid = (((self.stop - low - 7) / NUMBERS_PER_BYTE + 1) as usize).min(self.segment.len());
        let last_low = low + NUMBERS_PER_BYTE * (valid - 1) as u64;
        for (bit, &offset) in BIT_VALUES.iter().enumerate() {
            if last_low + offset > self.stop {
                self.segment[valid - 1] &= !(1 << bit);
            }
        }
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::small_primes;

    fn reference(start: u64, stop: u64) -> Vec<u64> {
        let sieve = small_primes(stop as u32);
        sieve
            .into_iter()
            .map(u64::from)
            .filter(|&p| p >= start && p >= 7)
            .collect()
    }

    fn run(start: u64, stop: u64, config: &SieveConfig) -> Vec<u64> {
        let primes = small_primes(stop.isqrt() as u32);
        let primes: Vec<u32> = primes.into_iter().filter(|&p| p >= 7).collect();
        let engine = SegmentedSieve::new(start, stop, config).unwrap();
        let mut found = Vec::new();
        let mut sink = |segment: &[u8], low: u64| {
            crate::extract::for_each_prime::<u64, _>(segment, low, |p| found.push(p));
        };
        engine.sieve(&primes, &mut sink);
        found
    }

    #[test]
    fn test_single_segment() {
        let config = SieveConfig::new();
        assert_eq!(run(7, 1000, &config), reference(7, 1000));
    }

    #[test]
    fn test_all_tiers_with_tiny_segments() {
        // 1 KB segments: small <= 1536, medium <= 9216, big above
        let config = SieveConfig::new().sieve_size_kb(1);
        let stop = 200_000_000;
        let found = run(stop - 100_000, stop, &config);
        let expected: Vec<u64> = (stop - 100_000..=stop)
            .filter(|&n| n % 2 == 1 && (3..).step_by(2).take_while(|d| d * d <= n).all(|d| n % d != 0))
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let config = SieveConfig::new().sieve_size_kb(1);
        assert_eq!(run(7, 7, &config), vec![7]);
        assert_eq!(run(101, 103, &config), vec![101, 103]);
        assert_eq!(run(102, 106, &config), vec![103]);
        assert_eq!(run(104, 106, &config), Vec::<u64>::new());
        assert_eq!(run(11, 100_000, &config), reference(11, 100_000));
        assert_eq!(run(12, 99_991, &config), reference(12, 99_991));
    }

    #[test]
    fn test_presieve_limits_agree() {
        for limit in [11, 13, 17, 19, 23] {
            let config = SieveConfig::new().presieve_limit(limit).sieve_size_kb(2);
            assert_eq!(run(7, 300_000, &config), reference(7, 300_000), "limit {}", limit);
        }
    }

    #[test]
    fn test_segment_size_shrinks_for_small_intervals() {
        let engine = SegmentedSieve::new(7, 1000, &SieveConfig::new()).unwrap();
        assert_eq!(engine.segment_bytes(), 64);
        let engine = SegmentedSieve::new(7, 1 << 30, &SieveConfig::new()).unwrap();
        assert_eq!(engine.segment_bytes(), 32 * 1024);
    }

    #[test]
    fn test_primes_land_in_their_tier() {
        let config = SieveConfig::new().sieve_size_kb(1);
        let stop = 10_000_000_000u64;
        let mut engine = SegmentedSieve::new(stop - 10_000_000, stop, &config).unwrap();
        assert_eq!(engine.segment_bytes(), 1024);
        let mut ignore = |_: &[u8], _: u64| {};
        for prime in [29u64, 1531, 1543, 9203, 9221, 99_991] {
            engine.add_sieving_prime(prime, &mut ignore);
        }
        assert_eq!(engine.tier_sizes(), (2, 2, 2));
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let config = SieveConfig::new();
        assert!(SegmentedSieve::new(5, 100, &config).is_err());
        assert!(SegmentedSieve::new(100, 99, &config).is_err());
        assert!(SegmentedSieve::new(7, MAX_STOP + 1, &config).is_err());
        assert!(SegmentedSieve::new(7, 100, &config.clone().presieve_limit(7)).is_err());
    }
}
