use std::io::Write;

use super::super::range_codec::{RangeEncPrice, RangeEncProbability, RangeEncoder};

const BANK_SIZE: usize = 0x100;

/// Which of the three probability banks of a subcoder a bit is coded with.
///
/// Plain literals only ever use `Plain`. Delta literals use `MatchAware` with the
/// corresponding bit of the match byte, until the first bit where the literal and the
/// match byte differ. From there on the rest of the literal is coded with `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralBank {
    Plain,
    MatchAware(u32),
}

impl LiteralBank {
    fn offset(self) -> usize {
        match self {
            LiteralBank::Plain => 0,
            LiteralBank::MatchAware(0) => BANK_SIZE,
            LiteralBank::MatchAware(_) => BANK_SIZE * 2,
        }
    }
}

/// Walks the banks used by a delta literal, calling `f` with the bank, the tree node and
/// the bit for each of the 8 bits of `symbol`.
#[inline(always)]
fn for_each_delta_bit<E>(
    symbol: u8,
    match_byte: u8,
    mut f: impl FnMut(LiteralBank, usize, u32) -> Result<(), E>,
) -> Result<(), E> {
    let symbol = symbol as u32;
    let match_byte = match_byte as u32;

    let mut still_matching = true;
    let mut node = 1usize;
    for i in (0..8).rev() {
        let bit = (symbol >> i) & 1;
        let match_bit = (match_byte >> i) & 1;

        let bank = if still_matching {
            LiteralBank::MatchAware(match_bit)
        } else {
            LiteralBank::Plain
        };
        f(bank, node, bit)?;

        node = (node << 1) | bit as usize;
        still_matching &= bit == match_bit;
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub(crate) struct LiteralSubcoder {
    probs: [RangeEncProbability; BANK_SIZE * 3],
}

impl LiteralSubcoder {
    pub fn new() -> Self {
        Self {
            probs: [RangeEncProbability::new(); BANK_SIZE * 3],
        }
    }

    pub fn reset(&mut self) {
        self.probs.iter_mut().for_each(|p| p.reset());
    }

    #[inline(always)]
    fn prob(&mut self, bank: LiteralBank, node: usize) -> &mut RangeEncProbability {
        &mut self.probs[bank.offset() + node]
    }

    /// Encodes all 8 bits of `symbol` with the plain bank, as an 8 bit tree.
    pub fn encode(&mut self, rc: &mut RangeEncoder<impl Write>, symbol: u8) -> std::io::Result<()> {
        let symbol = symbol as u32;

        let mut node = 1usize;
        for i in (0..8).rev() {
            let bit = (symbol >> i) & 1;
            rc.encode_bit(self.prob(LiteralBank::Plain, node), bit)?;
            node = (node << 1) | bit as usize;
        }

        Ok(())
    }

    /// Encodes `symbol` using the byte at the last match distance as extra context.
    pub fn encode_delta(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        symbol: u8,
        match_byte: u8,
    ) -> std::io::Result<()> {
        for_each_delta_bit(symbol, match_byte, |bank, node, bit| {
            rc.encode_bit(self.prob(bank, node), bit).map(|_| ())
        })
    }

    pub fn get_price(&self, symbol: u8) -> RangeEncPrice {
        let symbol = symbol as u32;

        let mut price = RangeEncPrice::zero();
        let mut node = 1usize;
        for i in (0..8).rev() {
            let bit = (symbol >> i) & 1;
            price += self.probs[LiteralBank::Plain.offset() + node].get_bit_price(bit);
            node = (node << 1) | bit as usize;
        }
        price
    }

    pub fn get_delta_price(&self, symbol: u8, match_byte: u8) -> RangeEncPrice {
        let mut price = RangeEncPrice::zero();
        let walked: Result<(), std::convert::Infallible> =
            for_each_delta_bit(symbol, match_byte, |bank, node, bit| {
                price += self.probs[bank.offset() + node].get_bit_price(bit);
                Ok(())
            });
        match walked {
            Ok(()) => price,
            Err(never) => match never {},
        }
    }

    #[cfg(test)]
    pub fn decode(
        &mut self,
        rc: &mut super::super::range_codec::RangeDecoder<impl std::io::Read>,
    ) -> std::io::Result<u8> {
        let mut node = 1usize;
        while node < 0x100 {
            let bit = rc.decode_bit(self.prob(LiteralBank::Plain, node))?;
            node = (node << 1) | bit as usize;
        }
        Ok(node as u8)
    }

    #[cfg(test)]
    pub fn decode_delta(
        &mut self,
        rc: &mut super::super::range_codec::RangeDecoder<impl std::io::Read>,
        match_byte: u8,
    ) -> std::io::Result<u8> {
        let match_byte = match_byte as u32;

        let mut still_matching = true;
        let mut node = 1usize;
        for i in (0..8).rev() {
            let match_bit = (match_byte >> i) & 1;
            let bank = if still_matching {
                LiteralBank::MatchAware(match_bit)
            } else {
                LiteralBank::Plain
            };

            let bit = rc.decode_bit(self.prob(bank, node))?;
            node = (node << 1) | bit as usize;
            still_matching &= bit == match_bit;
        }
        Ok(node as u8)
    }
}
