//! Big sieving primes: fewer than one multiple per segment.
//!
//! Each prime sits in the list of the segment where its next multiple
//! falls. The lists form a ring indexed by segment number, so crossing off
//! a segment only touches the primes that are actually due.

use tracing::debug;

use crate::bucket::{BucketId, BucketPool};
use crate::wheel::{NUMBERS_PER_BYTE, WHEEL, WheelPrime};

pub struct EratBig {
    pool: BucketPool,
    /// One bucket chain per upcoming segment.
    lists: Vec<Option<BucketId>>,
    current: usize,
    log2_segment: u32,
    /// Primes must be above `min` and at most `max_prime`.
    min: u64,
    max_prime: u64,
}

impl EratBig {
    /// `segment_bytes` must be a power of two.
    pub fn new(
        segment_bytes: usize,
        min: u64,
        max_prime: u64,
        bucket_size: usize,
        memory_per_alloc: usize,
    ) -> Self {
        assert!(segment_bytes.is_power_of_two());
        let log2_segment = segment_bytes.trailing_zeros();

        // Largest distance (in bytes) between two multiples of max_prime,
        // plus the segment a freshly added prime may start in.
        let max_step = 6 * (max_prime / NUMBERS_PER_BYTE) as usize + 7;
        let ring = (((max_step + segment_bytes) >> log2_segment) + 2).next_power_of_two();
        debug!(segment_bytes, max_prime, ring, "big tier ring");

        Self {
            pool: BucketPool::with_memory_per_alloc(bucket_size, memory_per_alloc),
            lists: vec![None; ring],
            current: 0,
            log2_segment,
            min,
            max_prime,
        }
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(|&head| self.pool.chain_len(head)).sum()
    }

    /// Number of segment lists in the ring.
    pub fn ring_len(&self) -> usize {
        self.lists.len()
    }

    pub fn add(&mut self, prime: u64, multiple_index: usize, wheel_index: usize) {
        assert!(
            prime > self.min && prime <= self.max_prime,
            "prime {} outside the big tier ({}, {}]",
            prime,
            self.min,
            self.max_prime
        );
        let entry = WheelPrime::new(prime, 0, wheel_index);
        self.store(entry, multiple_index, wheel_index);
    }

    /// Files `entry` under the segment that contains `index` (bytes from
    /// the start of the current segment).
    #[inline]
    fn store(&mut self, mut entry: WheelPrime, index: usize, wheel_index: usize) {
        let segment = index >> self.log2_segment;
        assert!(segment < self.lists.len(), "multiple {} beyond ring", index);
        let slot = (self.current + segment) & (self.lists.len() - 1);
        entry.set(index & ((1 << self.log2_segment) - 1), wheel_index);
        self.lists[slot] = Some(self.pool.push_front(self.lists[slot], entry));
    }

    /// Crosses off the multiples due in the current segment and moves on to
    /// the next one. `sieve` must be exactly one full segment.
    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        debug_assert_eq!(sieve.len(), 1 << self.log2_segment);

        // Primes with a step shorter than a segment are filed back into the
        // current list, so keep draining until it stays empty.
        while let Some(head) = self.lists[self.current].take() {
            let mut id = Some(head);
            while let Some(bucket) = id {
                for i in 0..self.pool.len(bucket) {
                    let entry = self.pool.get(bucket, i);
                    let index = entry.multiple_index();
                    let element = &WHEEL[entry.wheel_index()];
                    sieve[index] &= element.unset_mask;
                    let next = index
                        + entry.sieving_prime() * element.gap as usize
                        + element.correct as usize;
                    self.store(entry, next, element.next as usize);
                }
                id = self.pool.next(bucket);
                self.pool.release(bucket);
            }
        }
        self.current = (self.current + 1) & (self.lists.len() - 1);
    }
}
