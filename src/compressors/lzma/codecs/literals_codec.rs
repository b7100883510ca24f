mod subcoder;

use std::io::{self, Write};

pub use self::subcoder::LiteralBank;
use self::subcoder::LiteralSubcoder;

use super::range_codec::{RangeEncPrice, RangeEncoder};

/// A struct that helps choose the probability set to use for encoding/decoding
/// the next literal based on the previous uncompressed byte. lp and lc are
/// LZMA parameters.
#[derive(Debug, Clone)]
pub(crate) struct LiteralCoderContextBits {
    lc: u32,
    literal_pos_mask: u32,
}

impl LiteralCoderContextBits {
    pub fn new(lc: u32, lp: u32) -> Self {
        Self {
            lc,

            // Store the mask to avoid having to calculate it every time
            literal_pos_mask: (1 << lp) - 1,
        }
    }

    pub(crate) fn get_sub_coder_index(&self, prev_byte: u8, pos: u64) -> usize {
        let low = prev_byte as u32 >> (8 - self.lc);
        let high = pos as u32 & self.literal_pos_mask;
        (low | (high << self.lc)) as usize
    }
}

/// The literal coder: one subcoder per (position, previous byte) context.
#[derive(Debug, Clone)]
pub struct LiteralCodecEncoder {
    context: LiteralCoderContextBits,
    subcoders: Vec<LiteralSubcoder>,
}

impl LiteralCodecEncoder {
    pub fn new(lc: u32, lp: u32) -> Self {
        let count = 1usize << (lc + lp);

        Self {
            context: LiteralCoderContextBits::new(lc, lp),
            subcoders: vec![LiteralSubcoder::new(); count],
        }
    }

    pub fn reset(&mut self) {
        self.subcoders.iter_mut().for_each(|s| s.reset());
    }

    fn get_subcoder(&self, prev_byte: u8, pos: u64) -> &LiteralSubcoder {
        &self.subcoders[self.context.get_sub_coder_index(prev_byte, pos)]
    }

    fn get_subcoder_mut(&mut self, prev_byte: u8, pos: u64) -> &mut LiteralSubcoder {
        let i = self.context.get_sub_coder_index(prev_byte, pos);
        &mut self.subcoders[i]
    }

    pub fn encode(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        symbol: u8,
        prev_byte: u8,
        pos: u64,
    ) -> io::Result<()> {
        self.get_subcoder_mut(prev_byte, pos).encode(rc, symbol)
    }

    pub fn encode_delta(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        symbol: u8,
        prev_byte: u8,
        pos: u64,
        match_byte: u8,
    ) -> io::Result<()> {
        self.get_subcoder_mut(prev_byte, pos)
            .encode_delta(rc, symbol, match_byte)
    }

    pub fn get_price(&self, symbol: u8, prev_byte: u8, pos: u64) -> RangeEncPrice {
        self.get_subcoder(prev_byte, pos).get_price(symbol)
    }

    pub fn get_delta_price(
        &self,
        symbol: u8,
        prev_byte: u8,
        pos: u64,
        match_byte: u8,
    ) -> RangeEncPrice {
        self.get_subcoder(prev_byte, pos)
            .get_delta_price(symbol, match_byte)
    }
}

#[cfg(test)]
pub(crate) struct LiteralCodecDecoder {
    context: LiteralCoderContextBits,
    subcoders: Vec<LiteralSubcoder>,
}

#[cfg(test)]
impl LiteralCodecDecoder {
    pub fn new(lc: u32, lp: u32) -> Self {
        Self {
            context: LiteralCoderContextBits::new(lc, lp),
            subcoders: vec![LiteralSubcoder::new(); 1usize << (lc + lp)],
        }
    }

    pub fn decode(
        &mut self,
        rc: &mut super::range_codec::RangeDecoder<impl io::Read>,
        prev_byte: u8,
        pos: u64,
    ) -> io::Result<u8> {
        let i = self.context.get_sub_coder_index(prev_byte, pos);
        self.subcoders[i].decode(rc)
    }

    pub fn decode_delta(
        &mut self,
        rc: &mut super::range_codec::RangeDecoder<impl io::Read>,
        prev_byte: u8,
        pos: u64,
        match_byte: u8,
    ) -> io::Result<u8> {
        let i = self.context.get_sub_coder_index(prev_byte, pos);
        self.subcoders[i].decode_delta(rc, match_byte)
    }
}
