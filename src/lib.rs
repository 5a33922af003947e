//! Segmented sieve of Eratosthenes for 64-bit intervals.
//!
//! Counts and enumerates primes and prime k-tuplets (twins up to
//! septuplets), sequentially with [`PrimeSieve`] or across threads with
//! [`ParallelPrimeSieve`]. The sieve stores 30 integers per byte (modulo 30
//! wheel), removes the multiples of 7..=19 with a pre-sieve pattern and
//! distributes the remaining sieving primes over three bucketed tiers by
//! how often they hit a segment.

pub mod api;
pub mod bucket;
pub mod config;
pub mod erat_big;
pub mod erat_medium;
pub mod erat_small;
pub mod error;
pub mod extract;
pub mod finder;
pub mod generator;
pub mod nth_prime;
pub mod parallel;
pub mod presieve;
pub mod prime_sieve;
pub mod sieve;
pub mod storage;
pub mod wheel;

pub use config::{SieveConfig, Threads};
pub use error::{Error, Result};
pub use extract::TupletClass;
pub use finder::Counts;
pub use parallel::ParallelPrimeSieve;
pub use prime_sieve::{MAX_STOP, PrimeSieve, max_stop};
