use std::io::{self, Write};

use crate::error::{Error, Result};

use super::range_codec::{RangeEncPrice, RangeEncProbability, RangeEncoder};

/// Widest tree accepted. LZMA itself never goes past 8 bits, and the node table doubles
/// with every extra bit.
const MAX_BITS: u32 = 16;

/// A fixed width value codec, storing a probability for each node of a binary tree.
///
/// Every bit is coded against the probability at the node reached by the bits before it,
/// so the tree has `1 << num_bits` entries (index 0 is unused).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitTreeCodec {
    num_bits: u32,
    probs: Vec<RangeEncProbability>,
}

impl BitTreeCodec {
    pub fn new(num_bits: u32) -> Result<Self> {
        if num_bits == 0 || num_bits > MAX_BITS {
            return Err(Error::InvalidBitTreeWidth(num_bits));
        }

        Ok(Self {
            num_bits,
            probs: vec![RangeEncProbability::new(); 1usize << num_bits],
        })
    }

    #[cfg(test)]
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    pub fn reset(&mut self) {
        self.probs.iter_mut().for_each(|p| p.reset());
    }

    fn symbol_limit(&self) -> u64 {
        1u64 << self.num_bits
    }

    /// Encodes `symbol` most significant bit first.
    pub fn encode(&mut self, enc: &mut RangeEncoder<impl Write>, symbol: u32) -> io::Result<()> {
        debug_assert!((symbol as u64) < self.symbol_limit());

        let mut index = 1usize;
        for i in (0..self.num_bits).rev() {
            let bit = (symbol >> i) & 1;
            enc.encode_bit(&mut self.probs[index], bit)?;
            index = (index << 1) | bit as usize;
        }

        Ok(())
    }

    /// Encodes `symbol` least significant bit first.
    pub fn encode_reverse(
        &mut self,
        enc: &mut RangeEncoder<impl Write>,
        symbol: u32,
    ) -> io::Result<()> {
        debug_assert!((symbol as u64) < self.symbol_limit());

        let mut index = 1usize;
        for i in 0..self.num_bits {
            let bit = (symbol >> i) & 1;
            enc.encode_bit(&mut self.probs[index], bit)?;
            index = (index << 1) | bit as usize;
        }

        Ok(())
    }

    pub fn get_price(&self, symbol: u32) -> RangeEncPrice {
        let mut price = RangeEncPrice::zero();
        let mut index = 1usize;
        for i in (0..self.num_bits).rev() {
            let bit = (symbol >> i) & 1;
            price += self.probs[index].get_bit_price(bit);
            index = (index << 1) | bit as usize;
        }
        price
    }

    pub fn get_reverse_price(&self, symbol: u32) -> RangeEncPrice {
        let mut price = RangeEncPrice::zero();
        let mut index = 1usize;
        for i in 0..self.num_bits {
            let bit = (symbol >> i) & 1;
            price += self.probs[index].get_bit_price(bit);
            index = (index << 1) | bit as usize;
        }
        price
    }

    #[cfg(test)]
    pub(crate) fn decode(
        &mut self,
        dec: &mut super::range_codec::RangeDecoder<impl io::Read>,
    ) -> io::Result<u32> {
        let mut index = 1usize;
        for _ in 0..self.num_bits {
            let bit = dec.decode_bit(&mut self.probs[index])?;
            index = (index << 1) | bit as usize;
        }
        Ok((index - (1usize << self.num_bits)) as u32)
    }

    #[cfg(test)]
    pub(crate) fn decode_reverse(
        &mut self,
        dec: &mut super::range_codec::RangeDecoder<impl io::Read>,
    ) -> io::Result<u32> {
        let mut index = 1usize;
        let mut result = 0u32;
        for i in 0..self.num_bits {
            let bit = dec.decode_bit(&mut self.probs[index])?;
            index = (index << 1) | bit as usize;
            result |= bit << i;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::range_codec::RangeDecoder;
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bit_tree_width_is_validated() {
        assert!(matches!(
            BitTreeCodec::new(0),
            Err(Error::InvalidBitTreeWidth(0))
        ));
        for num_bits in [17, 32, 33] {
            assert!(matches!(
                BitTreeCodec::new(num_bits),
                Err(Error::InvalidBitTreeWidth(n)) if n == num_bits
            ));
        }
        assert_eq!(BitTreeCodec::new(1).unwrap().num_bits(), 1);

        let widest = BitTreeCodec::new(MAX_BITS).unwrap();
        assert_eq!(widest.num_bits(), 16);
        assert_eq!(widest.probs.len(), 1 << 16);
    }

    #[test]
    fn test_bit_tree_codec() {
        let mut codec = BitTreeCodec::new(8).unwrap();
        let mut encoder = RangeEncoder::new(Vec::new());
        for i in 0..256 {
            codec.encode(&mut encoder, i).unwrap();
        }
        let buf = encoder.finish().unwrap();

        assert_eq!(buf.len(), 227);

        let mut codec = BitTreeCodec::new(8).unwrap();
        let mut decoder = RangeDecoder::new_stream(Cursor::new(buf)).unwrap();
        for i in 0..256 {
            let result = codec.decode(&mut decoder).unwrap();
            assert_eq!(result, i);
        }

        assert!(decoder.is_finished());
    }

    #[test]
    fn test_bit_tree_codec_reverse() {
        let mut codec = BitTreeCodec::new(8).unwrap();
        let mut encoder = RangeEncoder::new(Vec::new());
        for i in 0..256 {
            codec.encode_reverse(&mut encoder, i).unwrap();
        }
        let buf = encoder.finish().unwrap();

        assert_eq!(buf.len(), 266);

        let mut codec = BitTreeCodec::new(8).unwrap();
        let mut decoder = RangeDecoder::new_stream(Cursor::new(buf)).unwrap();
        for i in 0..256 {
            let result = codec.decode_reverse(&mut decoder).unwrap();
            assert_eq!(result, i);
        }

        assert!(decoder.is_finished());
    }

    #[test]
    fn test_prices_match_encoded_cost() {
        let mut codec = BitTreeCodec::new(6).unwrap();
        let mut encoder = RangeEncoder::new(Vec::new());

        for symbol in [0, 63, 17, 17, 17, 42] {
            let forward = codec.get_price(symbol);
            let reverse = codec.get_reverse_price(symbol);

            // Encoding reports the same per-bit prices that the price functions sum up
            let mut charged = RangeEncPrice::zero();
            let mut index = 1usize;
            for i in (0..6).rev() {
                let bit = (symbol >> i) & 1;
                charged += encoder.encode_bit(&mut codec.probs[index], bit).unwrap();
                index = (index << 1) | bit as usize;
            }
            assert_eq!(charged, forward);
            assert!(reverse.value() > 0);
        }

        // Repeating a symbol makes it cheaper
        assert!(codec.get_price(17) < codec.get_price(18));

        encoder.finish().unwrap();
    }
}
