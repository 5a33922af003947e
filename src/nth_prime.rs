//! nth prime search over a prime counting function.
//!
//! The search first expands an interval using the prime number theorem
//! until it holds the `n`-th prime, then bisects it while it is wider than
//! [`FINAL_WINDOW`] and finally enumerates the remaining window. Only the
//! counting function differs between the sequential and parallel sieves.

use tracing::debug;

use crate::error::{Error, Result};
use crate::prime_sieve::MAX_STOP;

/// Windows up to this width are enumerated instead of bisected.
const FINAL_WINDOW: u64 = 1 << 20;

/// Length of an interval starting at `low` expected to hold `remaining`
/// primes, with some slack.
fn estimate_span(remaining: u64, low: u64) -> u64 {
    let n = remaining as f64;
    let x = (low as f64).max(n * n.max(3.0).ln());
    (n * x.max(3.0).ln() * 1.2 + 1000.0) as u64
}

/// Smallest `x` such that `[start, x]` holds `n` primes.
///
/// `count(low, high)` counts the primes inside `[low, high]` and
/// `kth(low, high, k)` returns the `k`-th of them.
pub fn search<C, K>(n: u64, start: u64, mut count: C, mut kth: K) -> Result<u64>
where
    C: FnMut(u64, u64) -> Result<u64>,
    K: FnMut(u64, u64, u64) -> Result<Option<u64>>,
{
    if n == 0 {
        return Err(Error::out_of_range("n must be at least 1"));
    }
    if start > MAX_STOP {
        return Err(Error::out_of_range(format!(
            "start {} > max stop {}",
            start, MAX_STOP
        )));
    }

    let mut low = start;
    let mut remaining = n;
    let mut high;
    loop {
        high = low.saturating_add(estimate_span(remaining, low)).min(MAX_STOP);
        let found = count(low, high)?;
        debug!(low, high, found, remaining, "nth prime probe");
        if found >= remaining {
            break;
        }
        if high == MAX_STOP {
            return Err(Error::out_of_range(format!(
                "nth prime {} > max stop {}",
                n, MAX_STOP
            )));
        }
        remaining -= found;
        low = high + 1;
    }

    // count(low, high) >= remaining holds from here on
    while high - low > FINAL_WINDOW {
        let mid = low + (high - low) / 2;
        let found = count(low, mid)?;
        if found >= remaining {
            high = mid;
        } else {
            remaining -= found;
            low = mid + 1;
        }
    }

    kth(low, high, remaining)?
        .ok_or_else(|| Error::out_of_range(format!("no prime {} in [{}, {}]", remaining, low, high)))
}
