//! Medium sieving primes: a few multiples per segment, or none.

use crate::bucket::{BucketId, BucketPool};
use crate::wheel::{WHEEL, WheelPrime};

pub struct EratMedium {
    pool: BucketPool,
    head: Option<BucketId>,
    /// Primes must be above `min` and at most `limit`.
    min: u64,
    limit: u64,
}

impl EratMedium {
    pub fn new(min: u64, limit: u64, bucket_size: usize) -> Self {
        Self {
            pool: BucketPool::new(bucket_size, 1),
            head: None,
            min,
            limit,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.pool.chain_len(self.head)
    }

    pub fn add(&mut self, prime: u64, multiple_index: usize, wheel_index: usize) {
        assert!(
            prime > self.min && prime <= self.limit,
            "prime {} outside the medium tier ({}, {}]",
            prime,
            self.min,
            self.limit
        );
        let entry = WheelPrime::new(prime, multiple_index, wheel_index);
        self.head = Some(self.pool.push_front(self.head, entry));
    }

    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let len = sieve.len();
        let mut id = self.head;
        while let Some(bucket) = id {
            for entry in self.pool.entries_mut(bucket) {
                let factor = entry.sieving_prime();
                let mut index = entry.multiple_index();
                let mut wheel_index = entry.wheel_index();
                while index < len {
                    let element = &WHEEL[wheel_index];
                    sieve[index] &= element.unset_mask;
                    index += factor * element.gap as usize + element.correct as usize;
                    wheel_index = element.next as usize;
                }
                entry.set(index - len, wheel_index);
            }
            id = self.pool.next(bucket);
        }
    }
}
