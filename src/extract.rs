//! Turns finished sieve segments into primes, tuplets and counts.

use std::fmt;
use std::sync::LazyLock;

use crate::wheel::{BIT_VALUES, NUMBERS_PER_BYTE};

/// Prime k-tuplet classes, `Primes` being the 1-tuplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TupletClass {
    Primes,
    Twins,
    Triplets,
    Quadruplets,
    Quintuplets,
    Sextuplets,
    Septuplets,
}

impl TupletClass {
    pub const ALL: [TupletClass; 7] = [
        TupletClass::Primes,
        TupletClass::Twins,
        TupletClass::Triplets,
        TupletClass::Quadruplets,
        TupletClass::Quintuplets,
        TupletClass::Sextuplets,
        TupletClass::Septuplets,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Members per tuplet.
    pub const fn size(self) -> usize {
        self as usize + 1
    }

    pub const fn name(self) -> &'static str {
        match self {
            TupletClass::Primes => "primes",
            TupletClass::Twins => "twin primes",
            TupletClass::Triplets => "prime triplets",
            TupletClass::Quadruplets => "prime quadruplets",
            TupletClass::Quintuplets => "prime quintuplets",
            TupletClass::Sextuplets => "prime sextuplets",
            TupletClass::Septuplets => "prime septuplets",
        }
    }

    /// Admissible offsets of the members from the smallest one.
    pub const fn patterns(self) -> &'static [&'static [u64]] {
        match self {
            TupletClass::Primes => &[&[0]],
            TupletClass::Twins => &[&[0, 2]],
            TupletClass::Triplets => &[&[0, 2, 6], &[0, 4, 6]],
            TupletClass::Quadruplets => &[&[0, 2, 6, 8]],
            TupletClass::Quintuplets => &[&[0, 2, 6, 8, 12], &[0, 4, 6, 10, 12]],
            TupletClass::Sextuplets => &[&[0, 4, 6, 10, 12, 16]],
            TupletClass::Septuplets => &[&[0, 2, 6, 8, 12, 18, 20], &[0, 2, 8, 12, 14, 18, 20]],
        }
    }
}

impl fmt::Display for TupletClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Integers the sieve can hand out.
pub trait PrimeValue: Copy {
    fn from_u64(value: u64) -> Self;
}

impl PrimeValue for u32 {
    #[inline]
    fn from_u64(value: u64) -> Self {
        value as u32
    }
}

impl PrimeValue for u64 {
    #[inline]
    fn from_u64(value: u64) -> Self {
        value
    }
}

/// Value of bit `t` of a little-endian 64-bit word of sieve bytes.
pub const WORD_BIT_VALUES: [u64; 64] = {
    let mut table = [0u64; 64];
    let mut t = 0;
    while t < 64 {
        table[t] = (t as u64 / 8) * NUMBERS_PER_BYTE + BIT_VALUES[t % 8];
        t += 1;
    }
    table
};

/// Set bits per byte.
pub const BYTE_POPCOUNT: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() as u8;
        i += 1;
    }
    table
};

/// Calls `f` for every set bit of `segment` in increasing order. Whole
/// 64-bit words first, then the remaining bytes.
pub fn for_each_prime<T, F>(segment: &[u8], low: u64, mut f: F)
where
    T: PrimeValue,
    F: FnMut(T),
{
    let mut base = low;
    let mut words = segment.chunks_exact(8);
    for chunk in &mut words {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        let mut word = u64::from_le_bytes(bytes);
        while word != 0 {
            let t = word.trailing_zeros() as usize;
            f(T::from_u64(base + WORD_BIT_VALUES[t]));
            word &= word - 1;
        }
        base += 8 * NUMBERS_PER_BYTE;
    }
    for &byte in words.remainder() {
        let mut bits = byte;
        while bits != 0 {
            let t = bits.trailing_zeros() as usize;
            f(T::from_u64(base + BIT_VALUES[t]));
            bits &= bits - 1;
        }
        base += NUMBERS_PER_BYTE;
    }
}

pub fn count_primes(segment: &[u8]) -> u64 {
    let mut words = segment.chunks_exact(8);
    let mut count: u64 = (&mut words)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            u64::from_le_bytes(bytes).count_ones() as u64
        })
        .sum();
    for &byte in words.remainder() {
        count += BYTE_POPCOUNT[byte as usize] as u64;
    }
    count
}

/// Value of bit `t` of the 16-bit window `previous | current << 8`,
/// relative to the lower bound of the previous byte.
const fn window_value(t: usize) -> u64 {
    (t as u64 / 8) * NUMBERS_PER_BYTE + BIT_VALUES[t % 8]
}

fn window_bit(value: u64) -> Option<usize> {
    (0..16).find(|&t| window_value(t) == value)
}

/// Window masks per class. A mask is only listed when its largest member
/// sits in the current byte, so a tuplet is matched exactly once, at the
/// byte holding its largest member.
static TUPLET_MASKS: LazyLock<[Vec<u16>; 7]> = LazyLock::new(|| {
    TupletClass::ALL.map(|class| {
        if class == TupletClass::Primes {
            return Vec::new();
        }
        let mut masks = Vec::new();
        for pattern in class.patterns() {
            for t in 0..16 {
                let first = window_value(t);
                let bits: Option<Vec<usize>> =
                    pattern.iter().map(|&offset| window_bit(first + offset)).collect();
                let Some(bits) = bits else { continue };
                if bits.iter().any(|&bit| bit >= 8) {
                    masks.push(bits.iter().fold(0u16, |mask, &bit| mask | 1 << bit));
                }
            }
        }
        masks.sort_by_key(|&mask| (15 - mask.leading_zeros(), mask.trailing_zeros()));
        masks
    })
});

pub fn tuplet_masks(class: TupletClass) -> &'static [u16] {
    &TUPLET_MASKS[class.index()]
}

/// Counts the tuplets of `class` whose largest member lies in `segment`.
/// `carry` is the byte preceding the segment (0 if there is none).
pub fn count_tuplets(segment: &[u8], carry: u8, class: TupletClass) -> u64 {
    let masks = tuplet_masks(class);
    let mut previous = carry as u16;
    let mut count = 0;
    for &byte in segment {
        if byte != 0 {
            let window = previous | (byte as u16) << 8;
            count += masks.iter().filter(|&&mask| window & mask == mask).count() as u64;
        }
        previous = byte as u16;
    }
    count
}

/// Calls `f` with the members of every tuplet of `class` whose largest
/// member lies in `segment`, in increasing order of that member.
pub fn for_each_tuplet<F>(segment: &[u8], low: u64, carry: u8, class: TupletClass, mut f: F)
where
    F: FnMut(&[u64]),
{
    let masks = tuplet_masks(class);
    let mut members = [0u64; 7];
    let mut previous = carry as u16;
    let mut base = low;
    for &byte in segment {
        if byte != 0 {
            let window = previous | (byte as u16) << 8;
            for &mask in masks.iter().filter(|&&mask| window & mask == mask) {
                let mut n = 0;
                let mut bits = mask;
                while bits != 0 {
                    let t = bits.trailing_zeros() as usize;
                    members[n] = base + window_value(t) - NUMBERS_PER_BYTE;
                    n += 1;
                    bits &= bits - 1;
                }
                f(&members[..n]);
            }
        }
        previous = byte as u16;
        base += NUMBERS_PER_BYTE;
    }
}
