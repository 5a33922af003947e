//! Segment sink that counts or enumerates primes and prime tuplets.

use std::ops::{AddAssign, Index};

use crate::extract::{self, TupletClass};
use crate::sieve::SegmentSink;
use crate::wheel::NUMBERS_PER_BYTE;

/// One count per [`TupletClass`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts([u64; 7]);

impl Counts {
    pub fn get(&self, class: TupletClass) -> u64 {
        self.0[class.index()]
    }

    pub fn add(&mut self, class: TupletClass, n: u64) {
        self.0[class.index()] += n;
    }

    pub fn as_array(&self) -> [u64; 7] {
        self.0
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, other: Self) {
        for (a, b) in self.0.iter_mut().zip(other.0) {
            *a += b;
        }
    }
}

impl Index<TupletClass> for Counts {
    type Output = u64;

    fn index(&self, class: TupletClass) -> &u64 {
        &self.0[class.index()]
    }
}

/// Primes and tuplets containing 2, 3 or 5, which the modulo 30 encoding
/// cannot represent.
const SMALL_TUPLETS: [(TupletClass, &[u64]); 8] = [
    (TupletClass::Primes, &[2]),
    (TupletClass::Primes, &[3]),
    (TupletClass::Primes, &[5]),
    (TupletClass::Twins, &[3, 5]),
    (TupletClass::Twins, &[5, 7]),
    (TupletClass::Triplets, &[5, 7, 11]),
    (TupletClass::Quadruplets, &[5, 7, 11, 13]),
    (TupletClass::Quintuplets, &[5, 7, 11, 13, 17]),
];

/// Small tuplets of `class` lying entirely inside `[start, stop]`.
pub fn small_tuplets(start: u64, stop: u64, class: TupletClass) -> impl Iterator<Item = &'static [u64]> {
    SMALL_TUPLETS
        .iter()
        .filter(move |(c, members)| {
            *c == class && members[0] >= start && members[members.len() - 1] <= stop
        })
        .map(|(_, members)| *members)
}

pub enum Mode<'a> {
    Count(Vec<TupletClass>),
    Primes(&'a mut dyn FnMut(u64)),
    Tuplets(TupletClass, &'a mut dyn FnMut(&[u64])),
}

/// Counts or enumerates the values `>= count_from` of every segment.
///
/// A parallel chunk sieves one byte before `count_from`; that byte is
/// skipped here and only serves as the tuplet carry, so tuplets crossing
/// the chunk boundary are seen by exactly one chunk.
pub struct PrimeFinder<'a> {
    mode: Mode<'a>,
    count_from: u64,
    carry: u8,
    counts: Counts,
}

impl<'a> PrimeFinder<'a> {
    pub fn counting(classes: &[TupletClass], count_from: u64) -> Self {
        Self::new(Mode::Count(classes.to_vec()), count_from)
    }

    pub fn primes(f: &'a mut dyn FnMut(u64), count_from: u64) -> Self {
        Self::new(Mode::Primes(f), count_from)
    }

    pub fn tuplets(class: TupletClass, f: &'a mut dyn FnMut(&[u64]), count_from: u64) -> Self {
        Self::new(Mode::Tuplets(class, f), count_from)
    }

    fn new(mode: Mode<'a>, count_from: u64) -> Self {
        Self {
            mode,
            count_from,
            carry: 0,
            counts: Counts::default(),
        }
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }
}

impl SegmentSink for PrimeFinder<'_> {
    fn process_segment(&mut self, segment: &[u8], low: u64) {
        // bytes whose largest value (low + 30 * i + 31) is below count_from
        let skip = if self.count_from > low + 31 {
            ((self.count_from - low - 31).div_ceil(NUMBERS_PER_BYTE) as usize).min(segment.len())
        } else {
            0
        };
        let carry = if skip > 0 { segment[skip - 1] } else { self.carry };
        let data = &segment[skip..];
        let base = low + NUMBERS_PER_BYTE * skip as u64;

        match &mut self.mode {
            Mode::Count(classes) => {
                for &class in classes.iter() {
                    let n = match class {
                        TupletClass::Primes => extract::count_primes(data),
                        _ => extract::count_tuplets(data, carry, class),
                    };
                    self.counts.add(class, n);
                }
            }
            Mode::Primes(f) => extract::for_each_prime(data, base, |p: u64| f(p)),
            Mode::Tuplets(class, f) => extract::for_each_tuplet(data, base, carry, *class, |m| f(m)),
        }

        if let Some(&last) = segment.last() {
            self.carry = last;
        }
    }
}
