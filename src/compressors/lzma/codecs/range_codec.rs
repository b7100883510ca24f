//! # Range Encoding for LZMA
//!
//! ### Range Encoding
//!
//! Range encoding is a variant of arithmetic encoding that uses two main
//! variables: `low` and `range`. The `low` variable stores the lower bound
//! of the current range of the output, and `range` stores the size of the
//! current range. As each symbol is encoded, `low` and `range` are updated
//! to narrow down the range of possible output values. The most probable
//! symbols take up a larger portion of this range.
//!
//! `low` is kept in a u64 so that a carry out of the 32 bit window can be
//! detected. Bytes whose value may still change because of such a carry
//! (a cached byte followed by a run of 0xFF) are held back until the carry is
//! resolved.
//!
//! ### Probability Modeling
//!
//! This implementation utilizes `RangeEncProbability`, instead of the usual
//! u16 used in other implementations, to make it more clear what's a
//! probability. Probabilities are used by the algorithm to determine how
//! likely a given symbol is to occur.

mod price;
mod probability;

pub use price::*;
pub use probability::*;

use byteorder::WriteBytesExt;

use std::io::{Result, Write};

const SHIFT_BITS: u32 = 8;
const BIT_MODEL_TOTAL_BITS: u32 = 11;
const BIT_MODEL_TOTAL: u32 = 1 << BIT_MODEL_TOTAL_BITS;
const MOVE_BITS: u32 = 5;

const TOP_VALUE: u32 = 1 << (32 - SHIFT_BITS);

/// Number of `shift_low` calls needed to push every pending byte of `low` out.
const FLUSH_SHIFTS: usize = 5;

pub struct RangeEncoder<W> {
    low: u64,
    range: u32,
    cache_size: u64,
    cache: u8,
    stream: W,
    bytes_written: u64,
}

impl<W: Write> RangeEncoder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            low: 0,
            range: 0xFFFFFFFFu32,
            cache_size: 1,
            cache: 0,
            stream: inner,
            bytes_written: 0,
        }
    }

    pub fn inner(&mut self) -> &mut W {
        &mut self.stream
    }

    /// Number of bytes handed to the underlying writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of bytes the stream would have if it was flushed right now.
    pub fn pending_len(&self) -> u64 {
        self.bytes_written + self.cache_size + 4
    }

    /// Resets the coder to its initial interval. Anything not flushed is lost.
    pub fn reset(&mut self) {
        self.low = 0;
        self.range = 0xFFFFFFFFu32;
        self.cache_size = 1;
        self.cache = 0;
    }

    /// Writes out every pending byte and starts a fresh interval, leaving the output byte aligned.
    pub fn flush(&mut self) -> Result<()> {
        for _ in 0..FLUSH_SHIFTS {
            self.shift_low()?;
        }
        self.reset();

        Ok(())
    }

    /// Flushes the coder and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.stream)
    }

    fn write_byte(&mut self, b: u8) -> Result<()> {
        self.bytes_written += 1;
        self.stream.write_u8(b)
    }

    fn shift_low(&mut self) -> Result<()> {
        let low_hi = (self.low >> 32) as u32;

        if low_hi != 0 || self.low < 0xFF000000u64 {
            // Either a carry happened or one can no longer reach the cached bytes,
            // so the cache and the run of 0xFF behind it are final.
            let mut temp = self.cache;
            loop {
                self.write_byte((temp as u32 + low_hi) as u8)?;
                temp = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (self.low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = (self.low & 0x00FFFFFF) << SHIFT_BITS;

        Ok(())
    }

    #[inline(always)]
    fn normalize(&mut self) -> Result<()> {
        while self.range < TOP_VALUE {
            self.range <<= SHIFT_BITS;
            self.shift_low()?;
        }
        Ok(())
    }

    /// Encodes a bit against a probability and adapts the probability.
    ///
    /// Returns the price the bit was charged, measured before the probability was updated.
    pub fn encode_bit(
        &mut self,
        prob: &mut RangeEncProbability,
        bit: u32,
    ) -> Result<RangeEncPrice> {
        if bit == 0 {
            self.encode_bit0(prob)
        } else {
            self.encode_bit1(prob)
        }
    }

    #[inline(always)]
    pub fn encode_bit0(&mut self, prob: &mut RangeEncProbability) -> Result<RangeEncPrice> {
        let price = prob.price0();
        self.range = (self.range >> BIT_MODEL_TOTAL_BITS) * prob.0 as u32;
        prob.increment();
        self.normalize()?;
        Ok(price)
    }

    #[inline(always)]
    pub fn encode_bit1(&mut self, prob: &mut RangeEncProbability) -> Result<RangeEncPrice> {
        let price = prob.price1();
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * prob.0 as u32;
        self.low += bound as u64;
        self.range -= bound;
        prob.decrement();
        self.normalize()?;
        Ok(price)
    }

    /// Encodes the low `count` bits of `value`, most significant first, with no modeling.
    pub fn encode_direct_bits(&mut self, value: u32, mut count: u32) -> Result<()> {
        debug_assert!((1..=32).contains(&count));

        loop {
            self.range >>= 1;
            count -= 1;

            let m = 0u32.wrapping_sub((value >> count) & 1); // 0 or 0xFFFFFFFF
            self.low += (self.range & m) as u64; // If bit is 0, add 0. If bit is 1, add range

            self.normalize()?;
            if count == 0 {
                break;
            }
        }
        Ok(())
    }
}

/// The inverse of [`RangeEncoder`], used to check encoder output in tests.
#[cfg(test)]
pub(crate) struct RangeDecoder<R> {
    stream: R,
    range: u32,
    code: u32,
}

#[cfg(test)]
impl<R: std::io::Read> RangeDecoder<R> {
    pub fn new_stream(mut stream: R) -> Result<Self> {
        use byteorder::{BigEndian, ReadBytesExt};

        let b = stream.read_u8()?;
        if b != 0x00 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "First byte of the range decoder stream must be 0x00",
            ));
        }
        let code = stream.read_u32::<BigEndian>()?;
        Ok(Self {
            stream,
            code,
            range: 0xFFFFFFFFu32,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.code == 0
    }

    fn normalize(&mut self) -> Result<()> {
        use byteorder::ReadBytesExt;

        if self.range < TOP_VALUE {
            let next = self.stream.read_u8()? as u32;
            self.code = (self.code << SHIFT_BITS) | next;
            self.range <<= SHIFT_BITS;
        }
        Ok(())
    }

    pub fn decode_bit(&mut self, prob: &mut RangeEncProbability) -> Result<u32> {
        self.normalize()?;
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * prob.0 as u32;
        if self.code < bound {
            self.range = bound;
            prob.increment();
            Ok(0)
        } else {
            self.range -= bound;
            self.code -= bound;
            prob.decrement();
            Ok(1)
        }
    }

    pub fn decode_direct_bits(&mut self, count: u32) -> Result<u32> {
        let mut result = 0u32;
        for _ in 0..count {
            self.normalize()?;

            self.range >>= 1;
            let t = (self.code.wrapping_sub(self.range)) >> 31; // 0 or 1
            self.code -= self.range & (t.wrapping_sub(1)); // If 0, subtract range. If 1, subtract 0
            result = (result << 1) | (1u32.wrapping_sub(t));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Keeps every digit of `low` so carries are resolved by plain long addition.
    struct NaiveRangeEncoder {
        digits: Vec<u8>,
        range: u32,
    }

    impl NaiveRangeEncoder {
        fn new() -> Self {
            // The leading cache byte plus the 4 bytes of the 32 bit window
            Self {
                digits: vec![0; 5],
                range: 0xFFFFFFFF,
            }
        }

        fn add(&mut self, value: u32) {
            let mut carry = value as u64;
            for digit in self.digits.iter_mut().rev() {
                if carry == 0 {
                    break;
                }
                let sum = *digit as u64 + (carry & 0xFF);
                *digit = sum as u8;
                carry = (carry >> 8) + (sum >> 8);
            }
        }

        fn encode_direct_bits(&mut self, value: u32, count: u32) {
            for i in (0..count).rev() {
                self.range >>= 1;
                if (value >> i) & 1 == 1 {
                    self.add(self.range);
                }
                while self.range < TOP_VALUE {
                    self.range <<= 8;
                    self.digits.push(0);
                }
            }
        }
    }

    fn longest_run(bytes: &[u8], value: u8) -> usize {
        let mut best = 0;
        let mut current = 0;
        for &b in bytes {
            current = if b == value { current + 1 } else { 0 };
            best = best.max(current);
        }
        best
    }

    #[test]
    fn test_range_encoder() {
        let mut encoder = RangeEncoder::new(Vec::new());
        for i in 0..100 {
            encoder.encode_direct_bits(i, 8).unwrap();
        }
        let buf = encoder.finish().unwrap();

        assert_eq!(buf.len(), 105);

        let mut decoder = RangeDecoder::new_stream(Cursor::new(buf)).unwrap();

        for i in 0..100 {
            let result = decoder.decode_direct_bits(8).unwrap();
            assert_eq!(result, i);
        }

        assert!(decoder.is_finished());
    }

    #[test]
    fn test_range_encoder_probs() {
        let mut prob = RangeEncProbability::new();
        let mut encoder = RangeEncoder::new(Vec::new());
        for i in 0..100 {
            for bit in 0..32 {
                encoder.encode_bit(&mut prob, (i >> bit) & 1).unwrap();
            }
        }
        let buf = encoder.finish().unwrap();

        assert_eq!(buf.len(), 197);

        let mut prob = RangeEncProbability::new();
        let mut decoder = RangeDecoder::new_stream(Cursor::new(buf)).unwrap();
        for i in 0..100 {
            let mut result = 0;
            for bit in 0..32 {
                result |= decoder.decode_bit(&mut prob).unwrap() << bit;
            }

            assert_eq!(result, i);
        }

        assert!(decoder.is_finished());
    }

    #[test]
    fn test_range_encoder_probs_zeroes() {
        let mut prob = RangeEncProbability::new();
        let mut encoder = RangeEncoder::new(Vec::new());
        for _ in 0..1000 {
            encoder.encode_bit0(&mut prob).unwrap();
        }
        encoder.encode_bit1(&mut prob).unwrap();
        for _ in 0..1000 {
            encoder.encode_bit(&mut prob, 0).unwrap();
        }
        let buf = encoder.finish().unwrap();

        assert_eq!(buf.len(), 14);

        let mut prob = RangeEncProbability::new();
        let mut decoder = RangeDecoder::new_stream(Cursor::new(buf)).unwrap();
        for _ in 0..1000 {
            assert_eq!(decoder.decode_bit(&mut prob).unwrap(), 0);
        }

        assert_eq!(decoder.decode_bit(&mut prob).unwrap(), 1);

        for _ in 0..1000 {
            assert_eq!(decoder.decode_bit(&mut prob).unwrap(), 0);
        }

        assert!(decoder.is_finished());
    }

    #[test]
    fn test_encode_bit_reports_price() {
        let mut prob = RangeEncProbability::new();
        let mut encoder = RangeEncoder::new(Vec::new());

        let expected = prob.price1();
        assert_eq!(encoder.encode_bit(&mut prob, 1).unwrap(), expected);

        // The model has adapted towards 1, so a 0 now costs more than a 1
        let zero = prob.price0();
        assert!(zero > prob.price1());
        assert_eq!(encoder.encode_bit(&mut prob, 0).unwrap(), zero);

        encoder.finish().unwrap();
    }

    #[test]
    fn test_carry_through_long_ff_chain() {
        // Each group nudges the top byte of `low` back up to 0xFF, so the encoder keeps
        // deferring bytes. The final 0xFF overflows the window and the carry has to
        // ripple through every deferred byte.
        let mut bytes = vec![0x12, 0x34];
        for _ in 0..4 {
            bytes.extend_from_slice(&[0x00, 0x02, 0x34]);
        }

        let mut encoder = RangeEncoder::new(Vec::new());
        let mut naive = NaiveRangeEncoder::new();
        for &b in &bytes {
            encoder.encode_direct_bits(b as u32, 8).unwrap();
            naive.encode_direct_bits(b as u32, 8);
        }

        assert!(longest_run(&naive.digits, 0xFF) >= 6);

        encoder.encode_direct_bits(0xFF, 8).unwrap();
        naive.encode_direct_bits(0xFF, 8);

        let output = encoder.finish().unwrap();
        assert_eq!(output, naive.digits);
        assert!(longest_run(&output, 0x00) >= 6);
        assert!(longest_run(&output, 0xFF) < 6);

        bytes.push(0xFF);
        let mut decoder = RangeDecoder::new_stream(Cursor::new(output)).unwrap();
        for &b in &bytes {
            assert_eq!(decoder.decode_direct_bits(8).unwrap(), b as u32);
        }
    }

    #[test]
    fn test_flush_realigns_stream() {
        let mut encoder = RangeEncoder::new(Vec::new());
        encoder.encode_direct_bits(0xAB, 8).unwrap();
        encoder.flush().unwrap();
        let first_len = encoder.bytes_written();
        encoder.encode_direct_bits(0xCD, 8).unwrap();
        let buf = encoder.finish().unwrap();

        let (first, second) = buf.split_at(first_len as usize);

        let mut decoder = RangeDecoder::new_stream(Cursor::new(first)).unwrap();
        assert_eq!(decoder.decode_direct_bits(8).unwrap(), 0xAB);

        let mut decoder = RangeDecoder::new_stream(Cursor::new(second)).unwrap();
        assert_eq!(decoder.decode_direct_bits(8).unwrap(), 0xCD);
        assert!(decoder.is_finished());
    }
}
