use std::ops::{Add, AddAssign};

use lazy_static::lazy_static;

use super::{RangeEncProbability, BIT_MODEL_TOTAL, BIT_MODEL_TOTAL_BITS};

/// Number of fractional bits in a price, i.e. prices are in 1/16ths of a bit.
pub const PRICE_SHIFT_BITS: u32 = 4;

/// The price table is indexed by the top 7 bits of the 11 bit probability.
const PRICE_TABLE_BITS: u32 = 7;
const PRICE_TABLE_SIZE: usize = 1 << PRICE_TABLE_BITS;
const PRICE_REDUCING_BITS: u32 = BIT_MODEL_TOTAL_BITS - PRICE_TABLE_BITS;

lazy_static! {
    static ref PROB_PRICES: [u32; PRICE_TABLE_SIZE] = build_price_table();
}

/// Builds `-log2(p)` for the center of every probability bucket, in 1/16 bit units.
///
/// The logarithm is computed with integers only (repeated squaring), so the table is
/// identical on every platform.
fn build_price_table() -> [u32; PRICE_TABLE_SIZE] {
    let step = 1u32 << PRICE_REDUCING_BITS;
    let mut table = [0u32; PRICE_TABLE_SIZE];

    for (i, entry) in table.iter_mut().enumerate() {
        let mut val = i as u32 * step + step / 2;
        let mut bits = 0u32;
        for _ in 0..PRICE_SHIFT_BITS {
            val *= val;
            bits <<= 1;
            while val >= 1 << 16 {
                val >>= 1;
                bits += 1;
            }
        }
        bits += 15;

        *entry = (BIT_MODEL_TOTAL_BITS << PRICE_SHIFT_BITS) - bits;
    }

    table
}

/// An estimated coding cost, in 1/16ths of a bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RangeEncPrice(u32);

impl RangeEncPrice {
    pub const fn zero() -> Self {
        Self(0)
    }

    /// A price larger than any real encoding, used as the starting point when looking for a minimum.
    pub const fn infinity() -> Self {
        Self(1 << 30)
    }

    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Price of a bit encoded against a probability, without touching the probability.
    pub fn get_bit_price(prob: RangeEncProbability, bit: u32) -> RangeEncPrice {
        debug_assert!(bit <= 1);

        let prob = if bit == 0 {
            prob.0 as u32
        } else {
            BIT_MODEL_TOTAL - prob.0 as u32
        };
        Self(PROB_PRICES[(prob >> PRICE_REDUCING_BITS) as usize])
    }

    /// Direct bits are equiprobable, so each costs exactly one bit.
    pub fn get_direct_bits_price(count: u32) -> RangeEncPrice {
        Self(count << PRICE_SHIFT_BITS)
    }
}

impl Add for RangeEncPrice {
    type Output = RangeEncPrice;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for RangeEncPrice {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
