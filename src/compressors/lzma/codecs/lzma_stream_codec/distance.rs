//! Match distance coding.
//!
//! A distance is split into a 6 bit slot (roughly `2 * log2(distance)`) coded with one of
//! four trees picked by the match length, followed by the bits below the leading two.
//! Small slots code those bits with a reverse tree of their own, large slots code the
//! middle bits raw and only model the lowest 4 ("align") bits.

use std::io::{self, Write};

use crate::error::Result;

use super::super::{
    bit_tree_codec::BitTreeCodec,
    length_codec::MATCH_LEN_MIN,
    range_codec::{RangeEncPrice, RangeEncoder},
};

pub const DIST_STATES: usize = 4;
const DIST_SLOT_BITS: u32 = 6;
pub const DIST_SLOTS: usize = 1 << DIST_SLOT_BITS;
pub const DIST_MODEL_START: u32 = 4;
pub const DIST_MODEL_END: u32 = 14;
pub const FULL_DISTANCES: usize = 1 << (DIST_MODEL_END / 2);

pub const ALIGN_BITS: u32 = 4;
const ALIGN_SIZE: usize = 1 << ALIGN_BITS;
const ALIGN_MASK: u32 = ALIGN_SIZE as u32 - 1;

const DIST_PRICE_UPDATE_INTERVAL: u32 = FULL_DISTANCES as u32;
const ALIGN_PRICE_UPDATE_INTERVAL: u32 = ALIGN_SIZE as u32;

const SPECIAL_SLOTS: usize = (DIST_MODEL_END - DIST_MODEL_START) as usize;

pub fn get_dist_state(len: u32) -> usize {
    if len < DIST_STATES as u32 + MATCH_LEN_MIN as u32 {
        len as usize - MATCH_LEN_MIN
    } else {
        DIST_STATES - 1
    }
}

pub fn get_dist_slot(dist: u32) -> u32 {
    if dist < DIST_MODEL_START {
        return dist;
    }

    let i = 31 - dist.leading_zeros();
    (i << 1) | ((dist >> (i - 1)) & 1)
}

/// Number of bits coded after the slot, and the smallest distance in the slot.
fn slot_footer(dist_slot: u32) -> (u32, u32) {
    let footer_bits = (dist_slot >> 1) - 1;
    let base = (2 | (dist_slot & 1)) << footer_bits;
    (footer_bits, base)
}

/// Probability trees shared by the encoder and the test decoder.
#[derive(Debug, Clone)]
struct DistanceCodec {
    slots: Vec<BitTreeCodec>,
    special: Vec<BitTreeCodec>,
    align: BitTreeCodec,
}

impl DistanceCodec {
    fn new() -> Result<Self> {
        let slots = (0..DIST_STATES)
            .map(|_| BitTreeCodec::new(DIST_SLOT_BITS))
            .collect::<Result<Vec<_>>>()?;

        let special = (DIST_MODEL_START..DIST_MODEL_END)
            .map(|dist_slot| BitTreeCodec::new(slot_footer(dist_slot).0))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            slots,
            special,
            align: BitTreeCodec::new(ALIGN_BITS)?,
        })
    }

    fn reset(&mut self) {
        self.slots.iter_mut().for_each(|tree| tree.reset());
        self.special.iter_mut().for_each(|tree| tree.reset());
        self.align.reset();
    }
}

pub struct DistanceCodecEncoder {
    codec: DistanceCodec,

    dist_price_remaining: u32,
    align_price_remaining: u32,

    /// Slot prices per dist_state, including the direct bits of the large slots.
    dist_slot_prices: [[RangeEncPrice; DIST_SLOTS]; DIST_STATES],
    full_dist_prices: [[RangeEncPrice; FULL_DISTANCES]; DIST_STATES],
    align_prices: [RangeEncPrice; ALIGN_SIZE],
}

impl DistanceCodecEncoder {
    pub fn new() -> Result<Self> {
        let mut encoder = Self {
            codec: DistanceCodec::new()?,
            dist_price_remaining: DIST_PRICE_UPDATE_INTERVAL,
            align_price_remaining: ALIGN_PRICE_UPDATE_INTERVAL,
            dist_slot_prices: [[RangeEncPrice::zero(); DIST_SLOTS]; DIST_STATES],
            full_dist_prices: [[RangeEncPrice::zero(); FULL_DISTANCES]; DIST_STATES],
            align_prices: [RangeEncPrice::zero(); ALIGN_SIZE],
        };

        encoder.update_dist_prices();
        encoder.update_align_prices();

        Ok(encoder)
    }

    /// Puts every probability back to its initial value and rebuilds the price tables.
    pub fn reset(&mut self) {
        self.codec.reset();
        self.update_dist_prices();
        self.update_align_prices();
    }

    pub fn encode(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        dist: u32,
        len: u32,
    ) -> io::Result<()> {
        let dist_slot = get_dist_slot(dist);
        self.codec.slots[get_dist_state(len)].encode(rc, dist_slot)?;

        if dist_slot >= DIST_MODEL_START {
            let (footer_bits, base) = slot_footer(dist_slot);
            let dist_reduced = dist - base;

            if dist_slot < DIST_MODEL_END {
                let index = (dist_slot - DIST_MODEL_START) as usize;
                self.codec.special[index].encode_reverse(rc, dist_reduced)?;
            } else {
                rc.encode_direct_bits(dist_reduced >> ALIGN_BITS, footer_bits - ALIGN_BITS)?;
                self.codec
                    .align
                    .encode_reverse(rc, dist_reduced & ALIGN_MASK)?;

                self.align_price_remaining -= 1;
                if self.align_price_remaining == 0 {
                    self.update_align_prices();
                }
            }
        }

        self.dist_price_remaining -= 1;
        if self.dist_price_remaining == 0 {
            self.update_dist_prices();
        }

        Ok(())
    }

    pub fn get_price(&self, dist: u32, len: u32) -> RangeEncPrice {
        let dist_state = get_dist_state(len);

        if dist < FULL_DISTANCES as u32 {
            self.full_dist_prices[dist_state][dist as usize]
        } else {
            // The slot price already includes the direct bits
            let dist_slot = get_dist_slot(dist);
            self.dist_slot_prices[dist_state][dist_slot as usize]
                + self.align_prices[(dist & ALIGN_MASK) as usize]
        }
    }

    fn update_dist_prices(&mut self) {
        self.dist_price_remaining = DIST_PRICE_UPDATE_INTERVAL;

        for dist_state in 0..DIST_STATES {
            let slot_prices = &mut self.dist_slot_prices[dist_state];
            let tree = &self.codec.slots[dist_state];

            for (dist_slot, price) in slot_prices.iter_mut().enumerate() {
                *price = tree.get_price(dist_slot as u32);
            }

            for dist_slot in DIST_MODEL_END..DIST_SLOTS as u32 {
                let (footer_bits, _) = slot_footer(dist_slot);
                slot_prices[dist_slot as usize] +=
                    RangeEncPrice::get_direct_bits_price(footer_bits - ALIGN_BITS);
            }

            for dist in 0..DIST_MODEL_START as usize {
                self.full_dist_prices[dist_state][dist] = slot_prices[dist];
            }
        }

        let mut dist = DIST_MODEL_START;
        for (index, tree) in self.codec.special.iter().enumerate() {
            let dist_slot = DIST_MODEL_START + index as u32;
            let (footer_bits, base) = slot_footer(dist_slot);

            for _ in 0..1u32 << footer_bits {
                let price = tree.get_reverse_price(dist - base);

                for dist_state in 0..DIST_STATES {
                    self.full_dist_prices[dist_state][dist as usize] =
                        self.dist_slot_prices[dist_state][dist_slot as usize] + price;
                }
                dist += 1;
            }
        }

        debug_assert_eq!(dist, FULL_DISTANCES as u32);
        debug_assert_eq!(self.codec.special.len(), SPECIAL_SLOTS);
    }

    fn update_align_prices(&mut self) {
        self.align_price_remaining = ALIGN_PRICE_UPDATE_INTERVAL;

        for (i, price) in self.align_prices.iter_mut().enumerate() {
            *price = self.codec.align.get_reverse_price(i as u32);
        }
    }
}

#[cfg(test)]
pub(crate) struct DistanceCodecDecoder {
    codec: DistanceCodec,
}

#[cfg(test)]
impl DistanceCodecDecoder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            codec: DistanceCodec::new()?,
        })
    }

    pub fn decode(
        &mut self,
        rc: &mut super::super::range_codec::RangeDecoder<impl io::Read>,
        len: u32,
    ) -> io::Result<u32> {
        let dist_slot = self.codec.slots[get_dist_state(len)].decode(rc)?;
        if dist_slot < DIST_MODEL_START {
            return Ok(dist_slot);
        }

        let (footer_bits, base) = slot_footer(dist_slot);
        if dist_slot < DIST_MODEL_END {
            let index = (dist_slot - DIST_MODEL_START) as usize;
            return Ok(base + self.codec.special[index].decode_reverse(rc)?);
        }

        let middle = rc.decode_direct_bits(footer_bits - ALIGN_BITS)?;
        let low = self.codec.align.decode_reverse(rc)?;
        Ok(base + (middle << ALIGN_BITS) + low)
    }
}
