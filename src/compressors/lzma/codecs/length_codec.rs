use std::io::{self, Write};

use crate::error::Result;
use crate::utils::const_variable_arr::ConstVariableArr;

use super::bit_tree_codec::BitTreeCodec;
use super::range_codec::{RangeEncPrice, RangeEncProbability, RangeEncoder};

pub(crate) const POS_STATES_MAX: usize = 1 << 4;

const LOW_LENGTH_BITS: u32 = 3;
const MID_LENGTH_BITS: u32 = 3;
const HIGH_LENGTH_BITS: u32 = 8;

const LOW_LENGTH_MAX: usize = 1 << LOW_LENGTH_BITS;
const MID_LENGTH_MAX: usize = 1 << MID_LENGTH_BITS;
const HIGH_LENGTH_MAX: usize = 1 << HIGH_LENGTH_BITS;

pub const MATCH_LEN_MIN: usize = 2;
pub const MATCH_LEN_MAX: usize =
    MATCH_LEN_MIN + LOW_LENGTH_MAX + MID_LENGTH_MAX + HIGH_LENGTH_MAX - 1;

const LEN_SYMBOLS: usize = MATCH_LEN_MAX - MATCH_LEN_MIN + 1;

const PRICE_UPDATE_INTERVAL: u32 = 32;

/// The length probabilities for a single pos_state.
#[derive(Debug, Clone)]
struct LengthCodecPosState {
    low: BitTreeCodec,
    mid: BitTreeCodec,
}

impl LengthCodecPosState {
    fn new() -> Result<Self> {
        Ok(Self {
            low: BitTreeCodec::new(LOW_LENGTH_BITS)?,
            mid: BitTreeCodec::new(MID_LENGTH_BITS)?,
        })
    }
}

/// Cached price of every length for one pos_state, and how many more lengths can be
/// encoded with that pos_state before the cache is rebuilt.
#[derive(Debug, Clone)]
struct LengthCodecPosStatePrice {
    remaining: u32,
    prices: Vec<RangeEncPrice>,
}

impl LengthCodecPosStatePrice {
    fn new() -> Self {
        Self {
            remaining: PRICE_UPDATE_INTERVAL,
            prices: vec![RangeEncPrice::zero(); LEN_SYMBOLS],
        }
    }
}

/// A length codec for LZMA, storing probabilities for each bit in a tree, for each length range.
///
/// The length ranges of the format are:
/// - 2-9 (low, 3 bits)
/// - 10-17 (mid, 3 bits)
/// - 18-273 (high, 8 bits)
///
/// pos_state represents the modulo position relative to the encoder's `1 << pb` value, allowing for different
/// probability tables to be used for different relative positions.
#[derive(Debug, Clone)]
struct LengthCodec {
    first_bit: RangeEncProbability,
    second_bit: RangeEncProbability,

    pos_states: ConstVariableArr<LengthCodecPosState, POS_STATES_MAX>,

    high: BitTreeCodec,
}

impl LengthCodec {
    fn new(pb: u32) -> Result<Self> {
        debug_assert!(pb <= 4);

        Ok(Self {
            first_bit: RangeEncProbability::new(),
            second_bit: RangeEncProbability::new(),
            high: BitTreeCodec::new(HIGH_LENGTH_BITS)?,

            pos_states: ConstVariableArr::new(LengthCodecPosState::new()?, 1 << pb),
        })
    }

    fn reset(&mut self) {
        self.first_bit.reset();
        self.second_bit.reset();
        self.high.reset();

        for pos_state in 0..self.pos_states.len() {
            let pos_state_data = &mut self.pos_states[pos_state];
            pos_state_data.low.reset();
            pos_state_data.mid.reset();
        }
    }
}

/// Encodes match lengths. LZMA keeps two of these, one for fresh matches and one for
/// repeated matches.
#[derive(Debug, Clone)]
pub struct LengthCodecEncoder {
    codec: LengthCodec,
    pos_state_prices: ConstVariableArr<LengthCodecPosStatePrice, POS_STATES_MAX>,
}

impl LengthCodecEncoder {
    pub fn new(pb: u32) -> Result<Self> {
        let mut encoder = Self {
            codec: LengthCodec::new(pb)?,
            pos_state_prices: ConstVariableArr::new(LengthCodecPosStatePrice::new(), 1 << pb),
        };

        encoder.update_all_prices();

        Ok(encoder)
    }

    /// Puts every probability back to its initial value and rebuilds the price caches.
    pub fn reset(&mut self) {
        self.codec.reset();
        self.update_all_prices();
    }

    fn update_all_prices(&mut self) {
        for pos_state in 0..self.pos_state_prices.len() {
            self.pos_state_prices[pos_state].remaining = PRICE_UPDATE_INTERVAL;
            self.update_prices_with_state(pos_state);
        }
    }

    pub fn encode(
        &mut self,
        enc: &mut RangeEncoder<impl Write>,
        len: u32,
        pos_state: u32,
    ) -> io::Result<()> {
        debug_assert!(len >= MATCH_LEN_MIN as u32);
        debug_assert!(len <= MATCH_LEN_MAX as u32);

        let pos_state = pos_state as usize;
        self.encode_symbol(enc, len as usize - MATCH_LEN_MIN, pos_state)?;

        let pos_state_price = &mut self.pos_state_prices[pos_state];
        pos_state_price.remaining -= 1;
        if pos_state_price.remaining == 0 {
            pos_state_price.remaining = PRICE_UPDATE_INTERVAL;
            self.update_prices_with_state(pos_state);
        }

        Ok(())
    }

    fn encode_symbol(
        &mut self,
        enc: &mut RangeEncoder<impl Write>,
        mut len: usize,
        pos_state: usize,
    ) -> io::Result<()> {
        let pos_state_data = &mut self.codec.pos_states[pos_state];

        if len < LOW_LENGTH_MAX {
            enc.encode_bit0(&mut self.codec.first_bit)?;
            return pos_state_data.low.encode(enc, len as u32);
        }

        enc.encode_bit1(&mut self.codec.first_bit)?;
        len -= LOW_LENGTH_MAX;

        if len < MID_LENGTH_MAX {
            enc.encode_bit0(&mut self.codec.second_bit)?;
            return pos_state_data.mid.encode(enc, len as u32);
        }

        enc.encode_bit1(&mut self.codec.second_bit)?;
        self.codec.high.encode(enc, (len - MID_LENGTH_MAX) as u32)
    }

    /// The cached price of `len` at `pos_state`. It may be up to 31 encodes stale.
    pub fn get_price(&self, len: u32, pos_state: u32) -> RangeEncPrice {
        self.pos_state_prices[pos_state as usize].prices[len as usize - MATCH_LEN_MIN]
    }

    fn update_prices_with_state(&mut self, pos_state: usize) {
        let pos_state_data = &self.codec.pos_states[pos_state];
        let prices = &mut self.pos_state_prices[pos_state].prices;

        let first_bit_price = self.codec.first_bit.price0();
        for (i, price) in prices[..LOW_LENGTH_MAX].iter_mut().enumerate() {
            *price = first_bit_price + pos_state_data.low.get_price(i as u32);
        }

        let first_bit_price = self.codec.first_bit.price1();
        let second_bit_price = self.codec.second_bit.price0();
        let mid_range = LOW_LENGTH_MAX..LOW_LENGTH_MAX + MID_LENGTH_MAX;
        for (i, price) in prices[mid_range].iter_mut().enumerate() {
            *price = first_bit_price + second_bit_price + pos_state_data.mid.get_price(i as u32);
        }

        let second_bit_price = self.codec.second_bit.price1();
        for (i, price) in prices[LOW_LENGTH_MAX + MID_LENGTH_MAX..]
            .iter_mut()
            .enumerate()
        {
            *price = first_bit_price + second_bit_price + self.codec.high.get_price(i as u32);
        }
    }
}

#[cfg(test)]
pub(crate) struct LengthCodecDecoder {
    codec: LengthCodec,
}

#[cfg(test)]
impl LengthCodecDecoder {
    pub fn new(pb: u32) -> Result<Self> {
        Ok(Self {
            codec: LengthCodec::new(pb)?,
        })
    }

    pub fn decode(
        &mut self,
        dec: &mut super::range_codec::RangeDecoder<impl io::Read>,
        pos_state: u32,
    ) -> io::Result<u32> {
        let pos_state_data = &mut self.codec.pos_states[pos_state as usize];

        if dec.decode_bit(&mut self.codec.first_bit)? == 0 {
            return Ok(pos_state_data.low.decode(dec)? + MATCH_LEN_MIN as u32);
        }

        if dec.decode_bit(&mut self.codec.second_bit)? == 0 {
            let len = pos_state_data.mid.decode(dec)?;
            return Ok(len + (MATCH_LEN_MIN + LOW_LENGTH_MAX) as u32);
        }

        let len = self.codec.high.decode(dec)?;
        Ok(len + (MATCH_LEN_MIN + LOW_LENGTH_MAX + MID_LENGTH_MAX) as u32)
    }
}
