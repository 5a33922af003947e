//! Pre-sieve pattern.
//!
//! Multiples of the primes `7..=limit` repeat every `7 * 11 * ... * limit`
//! bytes of the modulo 30 encoding. The pattern is built once and copied
//! into every fresh segment, which removes most composites before the
//! wheel tiers start crossing off.

use crate::wheel::{NUMBERS_PER_BYTE, locate};

const PRESIEVE_PRIMES: [u64; 6] = [7, 11, 13, 17, 19, 23];

pub struct PreSieve {
    limit: u32,
    primes: Vec<u64>,
    pattern: Vec<u8>,
}

impl PreSieve {
    /// Builds the pattern for the primes `7..=limit`, `11 <= limit <= 23`.
    pub fn new(limit: u32) -> Self {
        assert!(
            (11..=23).contains(&limit),
            "presieve limit {} not in 11..=23",
            limit
        );
        let primes: Vec<u64> = PRESIEVE_PRIMES
            .iter()
            .copied()
            .filter(|&p| p <= limit as u64)
            .collect();
        let len: u64 = primes.iter().product();
        let mut pattern = vec![0xff_u8; len as usize];

        // The pattern covers 7..=30 * len + 1 with low = 0.
        let last = NUMBERS_PER_BYTE * len + 1;
        for &p in &primes {
            let mut q = 1;
            while p * q <= last {
                if let Some((byte, bit)) = locate(p * q, 0) {
                    pattern[byte] &= !(1u8 << bit);
                }
                q += 2;
            }
        }

        Self {
            limit,
            primes,
            pattern,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The pre-sieved primes, their own bits are cleared by the pattern.
    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// Pattern length in bytes.
    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    /// Overwrites `segment` with the pattern rotation for a segment
    /// starting at `low` (a multiple of 30).
    pub fn apply(&self, segment: &mut [u8], low: u64) {
        let mut offset = ((low / NUMBERS_PER_BYTE) % self.pattern.len() as u64) as usize;
        let mut filled = 0;
        while filled < segment.len() {
            let n = (segment.len() - filled).min(self.pattern.len() - offset);
            segment[filled..filled + n].copy_from_slice(&self.pattern[offset..offset + n]);
            filled += n;
            offset = 0;
        }
    }
}
