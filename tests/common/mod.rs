#![allow(dead_code)]

use segsieve::generator::small_primes;

/// Plain segmented sieve over `[start, stop]`, one bool per integer.
pub fn reference_primes(start: u64, stop: u64) -> Vec<u64> {
    if stop < 2 || start > stop {
        return vec![];
    }
    let start = start.max(2);
    let mut is_prime = vec![true; (stop - start + 1) as usize];
    for p in small_primes(stop.isqrt() as u32) {
        let p = p as u64;
        let first = (p * p).max(start.div_ceil(p) * p);
        let mut m = first;
        while m <= stop {
            is_prime[(m - start) as usize] = false;
            m += p;
        }
    }
    is_prime
        .iter()
        .enumerate()
        .filter(|&(_, &is_p)| is_p)
        .map(|(i, _)| start + i as u64)
        .collect()
}

pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

/// Tuplets found by matching the admissible patterns against a prime list.
pub fn reference_tuplets(primes: &[u64], offsets: &[&[u64]]) -> usize {
    let set: std::collections::HashSet<u64> = primes.iter().copied().collect();
    let mut count = 0;
    for &p in primes {
        for pattern in offsets {
            if pattern.iter().all(|&d| set.contains(&(p + d))) {
                count += 1;
            }
        }
    }
    count
}
