//! Modulo 30 wheel.
//!
//! A sieve byte covers 30 integers. Bit `j` of byte `i` represents
//! `low + 30 * i + BIT_VALUES[j]`, so only integers coprime to 30 are stored
//! (8 bits per 30 integers). Sieving primes walk their multiples `p * q`
//! with `q` coprime to 30 using [`WHEEL`].

/// Integers covered by one sieve byte.
pub const NUMBERS_PER_BYTE: u64 = 30;

/// Offset of each bit relative to the byte's lower bound.
pub const BIT_VALUES: [u64; 8] = [7, 11, 13, 17, 19, 23, 29, 31];

/// Residues coprime to 30, in wheel order.
const RESIDUES: [u64; 8] = [1, 7, 11, 13, 17, 19, 23, 29];

/// Distance from `RESIDUES[w]` to the next residue.
const GAPS: [u64; 8] = [6, 4, 2, 4, 2, 4, 6, 2];

/// Bit of a residue mod 30, 8 when the residue is not coprime to 30.
const fn residue_bit(residue: u64) -> usize {
    match residue {
        7 => 0,
        11 => 1,
        13 => 2,
        17 => 3,
        19 => 4,
        23 => 5,
        29 => 6,
        1 => 7,
        _ => 8,
    }
}

const fn residue_index(residue: u64) -> usize {
    let mut i = 0;
    while i < 8 {
        if RESIDUES[i] == residue {
            return i;
        }
        i += 1;
    }
    8
}

/// One step of a sieving prime's walk over its multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelElement {
    /// AND mask clearing the bit of the current multiple.
    pub unset_mask: u8,
    /// `q` gap to the next multiplier coprime to 30.
    pub gap: u8,
    /// Extra bytes contributed by `prime % 30` and the bit change.
    pub correct: u8,
    /// Wheel index of the next multiple.
    pub next: u8,
}

/// Wheel indexed by `8 * residue_index(p % 30) + residue_index(q % 30)`.
///
/// For `p = 30 * k + r` the next multiple is
/// `k * gap + correct` bytes further along the sieve.
pub static WHEEL: [WheelElement; 64] = build_wheel();

const fn build_wheel() -> [WheelElement; 64] {
    let mut table = [WheelElement {
        unset_mask: 0,
        gap: 0,
        correct: 0,
        next: 0,
    }; 64];
    let mut pi = 0;
    while pi < 8 {
        let rp = RESIDUES[pi];
        let mut w = 0;
        while w < 8 {
            let w_next = (w + 1) % 8;
            let bit = residue_bit(rp * RESIDUES[w] % 30);
            let bit_next = residue_bit(rp * RESIDUES[w_next] % 30);
            let gap = GAPS[w];
            let correct = (rp * gap + BIT_VALUES[bit] - BIT_VALUES[bit_next]) / 30;
            table[pi * 8 + w] = WheelElement {
                unset_mask: !(1u8 << bit),
                gap: gap as u8,
                correct: correct as u8,
                next: (pi * 8 + w_next) as u8,
            };
            w += 1;
        }
        pi += 1;
    }
    table
}

/// Sieving prime as stored in the bucket tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelPrime {
    /// `prime / 30`
    sieving_prime: u32,
    /// Byte offset of the next multiple relative to the current segment.
    multiple_index: u32,
    wheel_index: u32,
}

pub const WHEEL_PRIME_BYTES: usize = std::mem::size_of::<WheelPrime>();

impl WheelPrime {
    #[inline]
    pub fn new(prime: u64, multiple_index: usize, wheel_index: usize) -> Self {
        Self {
            sieving_prime: (prime / NUMBERS_PER_BYTE) as u32,
            multiple_index: multiple_index as u32,
            wheel_index: wheel_index as u32,
        }
    }

    #[inline]
    pub fn sieving_prime(&self) -> usize {
        self.sieving_prime as usize
    }

    /// The sieving prime itself, recovered from its residue class.
    #[inline]
    pub fn prime(&self) -> usize {
        self.sieving_prime as usize * NUMBERS_PER_BYTE as usize
            + RESIDUES[self.wheel_index as usize / 8] as usize
    }

    #[inline]
    pub fn multiple_index(&self) -> usize {
        self.multiple_index as usize
    }

    #[inline]
    pub fn wheel_index(&self) -> usize {
        self.wheel_index as usize
    }

    #[inline]
    pub fn set(&mut self, multiple_index: usize, wheel_index: usize) {
        self.multiple_index = multiple_index as u32;
        self.wheel_index = wheel_index as u32;
    }
}

/// Byte offset (from `low`) and bit of `value`, `None` if `value` shares a
/// factor with 30. `value` must be at least `low + 7`.
#[inline]
pub fn locate(value: u64, low: u64) -> Option<(usize, usize)> {
    let bit = residue_bit(value % NUMBERS_PER_BYTE);
    if bit == 8 {
        return None;
    }
    let byte = (value - low - BIT_VALUES[bit]) / NUMBERS_PER_BYTE;
    Some((byte as usize, bit))
}

/// First multiple of `prime` that has to be crossed off: `prime * q` with
/// `q` coprime to 30 and `prime * q >= max(prime^2, start)`.
///
/// Returns its byte offset relative to `low` and its wheel index, or `None`
/// when that multiple is greater than `stop`.
pub fn first_multiple(prime: u64, start: u64, stop: u64, low: u64) -> Option<(usize, usize)> {
    let pi = residue_index(prime % NUMBERS_PER_BYTE);
    assert!(pi < 8, "sieving prime {} is not coprime to 30", prime);

    let base = (prime * prime).max(start);
    let q0 = base.div_ceil(prime);
    let r = q0 % NUMBERS_PER_BYTE;
    let w = RESIDUES.iter().position(|&res| res >= r).unwrap_or(8);
    let next_residue = if w == 8 { 31 } else { RESIDUES[w] };
    let multiple = prime.checked_mul(q0 - r + next_residue)?;
    if multiple > stop {
        return None;
    }
    let (byte, _) = locate(multiple, low)?;
    Some((byte, pi * 8 + w % 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coprime_to_30(n: u64) -> bool {
        n % 2 != 0 && n % 3 != 0 && n % 5 != 0
    }

    #[test]
    fn test_locate_roundtrip_values() {
        let low = 300;
        assert_eq!(locate(307, low), Some((0, 0)));
        assert_eq!(locate(331, low), Some((0, 7)));
        assert_eq!(locate(337, low), Some((1, 0)));
        assert_eq!(locate(309, low), None);
        assert_eq!(locate(325, low), None);
    }

    #[test]
    fn test_first_multiple_of_seven() {
        // 49 = 7 * 7 lives in byte 1 (37..=61) at bit 4 (value 19).
        let (byte, wheel_index) = first_multiple(7, 7, 1000, 0).unwrap();
        assert_eq!(byte, 1);
        assert_eq!(wheel_index, 8 + 1);
        assert_eq!(WHEEL[wheel_index].unset_mask, !(1 << 4));
    }

    #[test]
    fn test_first_multiple_respects_start() {
        // smallest 7 * q >= 1000 with q coprime to 30 is 7 * 143 = 1001
        let low = 990;
        let (byte, wheel_index) = first_multiple(7, 1000, 10_000, low).unwrap();
        let bit = (!WHEEL[wheel_index].unset_mask).trailing_zeros() as usize;
        assert_eq!(low + 30 * byte as u64 + BIT_VALUES[bit], 1001);
    }

    #[test]
    fn test_first_multiple_beyond_stop() {
        assert!(first_multiple(101, 0, 10_000, 0).is_none());
        assert!(first_multiple(97, 0, 9409, 0).is_some());
    }

    #[test]
    fn test_wheel_walk_matches_multiples() {
        for prime in [7u64, 11, 13, 31, 37, 41, 43, 47, 53, 59, 61, 1009, 7919] {
            let low = 0;
            let (mut byte, mut wheel_index) = first_multiple(prime, 0, u64::MAX / 4, low).unwrap();
            let expected: Vec<u64> = (prime..)
                .filter(|&q| coprime_to_30(q))
                .take(40)
                .map(|q| prime * q)
                .collect();
            for &multiple in &expected {
                let element = WHEEL[wheel_index];
                let bit = (!element.unset_mask).trailing_zeros() as usize;
                assert_eq!(low + 30 * byte as u64 + BIT_VALUES[bit], multiple);
                byte += (prime / 30) as usize * element.gap as usize + element.correct as usize;
                wheel_index = element.next as usize;
            }
        }
    }

    #[test]
    fn test_full_wheel_cycle_spans_prime_bytes() {
        for prime in [7u64, 11, 13, 17, 19, 23, 29, 31, 97, 101] {
            let start = first_multiple(prime, 0, u64::MAX / 4, 0).unwrap();
            let (mut byte, mut wheel_index) = start;
            for _ in 0..8 {
                let element = WHEEL[wheel_index];
                byte += (prime / 30) as usize * element.gap as usize + element.correct as usize;
                wheel_index = element.next as usize;
            }
            assert_eq!(byte - start.0, prime as usize);
            assert_eq!(wheel_index, start.1);
        }
    }
}
