//! Convenience functions using the default configuration.
//!
//! Every function returns [`ERROR`] (`u64::MAX`) instead of an error; use
//! [`PrimeSieve`] or [`ParallelPrimeSieve`] to get the [`Error`] itself.
//!
//! [`Error`]: crate::Error

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::config::{SieveConfig, Threads};
use crate::error::Result;
use crate::extract::TupletClass;
use crate::parallel::ParallelPrimeSieve;
use crate::prime_sieve::{self, PrimeSieve};
use crate::storage::PrimeWriter;

/// Returned by every function of this module on failure.
pub const ERROR: u64 = u64::MAX;

fn sentinel(result: Result<u64>) -> u64 {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "sieve call failed");
        ERROR
    })
}

fn parallel(threads: Threads) -> Result<ParallelPrimeSieve> {
    ParallelPrimeSieve::with_config(SieveConfig::new().threads(threads))
}

pub fn count_primes(start: u64, stop: u64) -> u64 {
    sentinel(PrimeSieve::new().count(start, stop, TupletClass::Primes))
}

pub fn count_twins(start: u64, stop: u64) -> u64 {
    sentinel(PrimeSieve::new().count(start, stop, TupletClass::Twins))
}

pub fn count_triplets(start: u64, stop: u64) -> u64 {
    sentinel(PrimeSieve::new().count(start, stop, TupletClass::Triplets))
}

pub fn count_quadruplets(start: u64, stop: u64) -> u64 {
    sentinel(PrimeSieve::new().count(start, stop, TupletClass::Quadruplets))
}

pub fn count_quintuplets(start: u64, stop: u64) -> u64 {
    sentinel(PrimeSieve::new().count(start, stop, TupletClass::Quintuplets))
}

pub fn count_sextuplets(start: u64, stop: u64) -> u64 {
    sentinel(PrimeSieve::new().count(start, stop, TupletClass::Sextuplets))
}

pub fn count_septuplets(start: u64, stop: u64) -> u64 {
    sentinel(PrimeSieve::new().count(start, stop, TupletClass::Septuplets))
}

/// Counts on `threads` threads; [`Threads::All`] uses every core.
pub fn parallel_count_primes(start: u64, stop: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.count(start, stop, TupletClass::Primes)))
}

pub fn parallel_count_twins(start: u64, stop: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.count(start, stop, TupletClass::Twins)))
}

pub fn parallel_count_triplets(start: u64, stop: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.count(start, stop, TupletClass::Triplets)))
}

pub fn parallel_count_quadruplets(start: u64, stop: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.count(start, stop, TupletClass::Quadruplets)))
}

pub fn parallel_count_quintuplets(start: u64, stop: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.count(start, stop, TupletClass::Quintuplets)))
}

pub fn parallel_count_sextuplets(start: u64, stop: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.count(start, stop, TupletClass::Sextuplets)))
}

pub fn parallel_count_septuplets(start: u64, stop: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.count(start, stop, TupletClass::Septuplets)))
}

/// The `n`-th prime `>= start`.
pub fn nth_prime(n: u64, start: u64) -> u64 {
    sentinel(PrimeSieve::new().nth_prime(n, start))
}

pub fn parallel_nth_prime(n: u64, start: u64, threads: Threads) -> u64 {
    sentinel(parallel(threads).and_then(|sieve| sieve.nth_prime(n, start)))
}

/// Calls `f` for every prime in `[start, stop]` in increasing order and
/// returns how many there were.
pub fn callback_primes<F>(start: u64, stop: u64, mut f: F) -> u64
where
    F: FnMut(u64),
{
    let mut n = 0;
    let result = PrimeSieve::new().for_each_prime(start, stop, |p| {
        n += 1;
        f(p);
    });
    sentinel(result.map(|()| n))
}

/// Calls `f(prime, worker)` from several threads, in no particular order
/// across workers, and returns how many primes there were.
pub fn parallel_callback_primes<F>(start: u64, stop: u64, threads: Threads, f: F) -> u64
where
    F: Fn(u64, usize) + Sync,
{
    let n = AtomicU64::new(0);
    let result = parallel(threads).and_then(|sieve| {
        sieve.for_each_prime(start, stop, |p, worker| {
            n.fetch_add(1, Ordering::Relaxed);
            f(p, worker);
        })
    });
    sentinel(result.map(|()| n.load(Ordering::Relaxed)))
}

fn print(start: u64, stop: u64, class: TupletClass) -> u64 {
    let stdout = io::stdout();
    let mut writer = PrimeWriter::new(stdout.lock());
    let result = PrimeSieve::new().for_each_tuplet(start, stop, class, |members| {
        if members.len() == 1 {
            writer.write_prime(members[0]);
        } else {
            writer.write_tuplet(members);
        }
    });
    sentinel(result.and_then(|()| Ok(writer.finish()?)))
}

/// Prints the primes in `[start, stop]` to stdout, one per line, and
/// returns how many were printed.
pub fn print_primes(start: u64, stop: u64) -> u64 {
    print(start, stop, TupletClass::Primes)
}

pub fn print_twins(start: u64, stop: u64) -> u64 {
    print(start, stop, TupletClass::Twins)
}

pub fn print_triplets(start: u64, stop: u64) -> u64 {
    print(start, stop, TupletClass::Triplets)
}

pub fn print_quadruplets(start: u64, stop: u64) -> u64 {
    print(start, stop, TupletClass::Quadruplets)
}

pub fn print_quintuplets(start: u64, stop: u64) -> u64 {
    print(start, stop, TupletClass::Quintuplets)
}

pub fn print_sextuplets(start: u64, stop: u64) -> u64 {
    print(start, stop, TupletClass::Sextuplets)
}

pub fn print_septuplets(start: u64, stop: u64) -> u64 {
    print(start, stop, TupletClass::Septuplets)
}

pub fn max_stop() -> u64 {
    prime_sieve::max_stop()
}
