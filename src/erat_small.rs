//! Small sieving primes: many multiples per segment.

use crate::bucket::{BucketId, BucketPool};
use crate::wheel::{WHEEL, WheelPrime};

pub struct EratSmall {
    pool: BucketPool,
    head: Option<BucketId>,
    /// Largest prime accepted by this tier.
    limit: u64,
}

impl EratSmall {
    pub fn new(limit: u64, bucket_size: usize) -> Self {
        Self {
            pool: BucketPool::new(bucket_size, 1),
            head: None,
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
            prime <= self.limit,
            "prime {} exceeds the small tier limit {}",
            prime,
            self.limit
        );
        let entry = WheelPrime::new(prime, multiple_index, wheel_index);
        self.head = Some(self.pool.push_front(self.head, entry));
    }

    /// Crosses off the multiples of every small prime inside `sieve`.
    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let mut id = self.head;
        while let Some(bucket) = id {
            for entry in self.pool.entries_mut(bucket) {
                cross_off_prime(sieve, entry);
            }
            id = self.pool.next(bucket);
        }
    }
}

/// One full turn of the wheel (8 multiples) advances exactly `prime` bytes,
/// so whole turns run without bounds checks on the next index.
#[inline]
fn cross_off_prime(sieve: &mut [u8], entry: &mut WheelPrime) {
    let len = sieve.len();
    let factor = entry.sieving_prime();
    let turn = entry.prime();
    let mut index = entry.multiple_index();
    let mut wheel_index = entry.wheel_index();

    while index + turn <= len {
        for _ in 0..8 {
            let element = &WHEEL[wheel_index];
            sieve[index] &= element.unset_mask;
            index += factor * element.gap as usize + element.correct as usize;
            wheel_index = element.next as usize;
        }
    }
    while index < len {
        let element = &WHEEL[wheel_index];
        sieve[index] &= element.unset_mask;
        index += factor * element.gap as usize + element.correct as usize;
        wheel_index = element.next as usize;
    }
    entry.set(index - len, wheel_index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::first_multiple;

    #[test]
    fn test_crosses_off_all_multiples_of_seven() {
        let mut tier = EratSmall::new(100, 16);
        let (index, wheel_index) = first_multiple(7, 7, 100_000, 0).unwrap();
        tier.add(7, index, wheel_index);

        let mut sieve = vec![0xff_u8; 64];
        tier.cross_off(&mut sieve);
        for (i, &byte) in sieve.iter().enumerate() {
            for (bit, &offset) in crate::wheel::BIT_VALUES.iter().enumerate() {
                let value = 30 * i as u64 + offset;
                let crossed = byte & (1 << bit) == 0;
                assert_eq!(crossed, value % 7 == 0 && value >= 49, "value {}", value);
            }
        }
    }

    #[test]
    fn test_state_carries_to_next_segment() {
        let mut split = EratSmall::new(100, 16);
        let mut whole = EratSmall::new(100, 16);
        for prime in [7u64, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47] {
            let (index, wheel_index) = first_multiple(prime, 7, 100_000, 0).unwrap();
            split.add(prime, index, wheel_index);
            whole.add(prime, index, wheel_index);
        }
        assert_eq!(split.len(), 12);

        let mut expected = vec![0xff_u8; 256];
        whole.cross_off(&mut expected);

        let mut actual = vec![0xff_u8; 256];
        for chunk in actual.chunks_mut(64) {
            split.cross_off(chunk);
        }
        assert_eq!(actual, expected);
    }

    #[test]
    #[should_panic]
    fn test_rejects_prime_above_limit() {
        let mut tier = EratSmall::new(10, 16);
        tier.add(11, 0, 8 * 2);
    }
}
