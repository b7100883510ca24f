use crate::compressors::lzma::codecs::{
    length_codec::LengthCodecEncoder, literals_codec::LiteralCodecEncoder,
    range_codec::RangeEncPrice,
};

use super::{
    data_buffers::EncoderDataBuffer,
    distance::DistanceCodecEncoder,
    encoders::EncodeInstruction,
    state::{Reps, State},
    LZMACodec,
};

/// Read-only view of the encoder's models, used to estimate what packets would cost.
///
/// Nothing here touches a probability, so a match finder may price as many alternatives
/// as it likes before one of them is committed.
#[derive(Clone, Copy)]
pub struct EncoderPriceCalc<'a> {
    pub(super) codec: &'a LZMACodec,
    pub(super) literal_encoder: &'a LiteralCodecEncoder,
    pub(super) match_len_encoder: &'a LengthCodecEncoder,
    pub(super) rep_len_encoder: &'a LengthCodecEncoder,
    pub(super) dist_encoder: &'a DistanceCodecEncoder,
}

impl<'a> EncoderPriceCalc<'a> {
    pub fn state(&self) -> &'a State {
        &self.codec.state
    }

    pub fn reps(&self) -> &'a Reps {
        &self.codec.reps
    }

    pub fn pos_state(&self, pos: u64) -> u32 {
        pos as u32 & self.codec.pos_mask
    }

    /// Price of a literal packet, including the "not a match" bit. The state decides
    /// whether the literal is coded plainly or against `match_byte`.
    pub fn get_literal_price(
        &self,
        cur_byte: u8,
        match_byte: u8,
        prev_byte: u8,
        pos: u64,
        state: &State,
    ) -> RangeEncPrice {
        let pos_state = self.pos_state(pos) as usize;
        let prob = &self.codec.is_match_probs[state.get_idx()][pos_state];
        let packet_price = prob.get_bit_price(0);

        let value_price = if state.is_literal() {
            self.literal_encoder.get_price(cur_byte, prev_byte, pos)
        } else {
            self.literal_encoder
                .get_delta_price(cur_byte, prev_byte, pos, match_byte)
        };

        packet_price + value_price
    }

    pub fn get_any_match_price(&self, state: &State, pos_state: u32) -> AnyMatchPrice<'_> {
        let prob = &self.codec.is_match_probs[state.get_idx()][pos_state as usize];
        AnyMatchPrice {
            price_calc: self,
            any_match_price: prob.get_bit_price(1),
            state_idx: state.get_idx(),
            pos_state: pos_state as usize,
        }
    }

    /// Price of encoding `instruction` at the buffer's current position, in the current state.
    pub fn get_instruction_price(
        &self,
        instruction: &EncodeInstruction,
        buffer: &EncoderDataBuffer,
    ) -> RangeEncPrice {
        let pos = buffer.pos();
        let state = self.state();

        match *instruction {
            EncodeInstruction::Literal | EncodeInstruction::DeltaLiteral => {
                let match_byte = if buffer.is_empty() {
                    0
                } else {
                    buffer.get_history_byte(self.reps().get(0))
                };
                self.get_literal_price(
                    buffer.get_byte(0),
                    match_byte,
                    buffer.prev_byte(),
                    pos,
                    state,
                )
            }
            EncodeInstruction::ShortRep => self
                .get_any_match_price(state, self.pos_state(pos))
                .get_any_rep_price()
                .get_short_rep_price(),
            EncodeInstruction::Rep0Long { len }
            | EncodeInstruction::Rep1 { len }
            | EncodeInstruction::Rep2 { len }
            | EncodeInstruction::Rep3 { len } => {
                let rep = instruction.rep_index().unwrap_or(0);
                self.get_any_match_price(state, self.pos_state(pos))
                    .get_any_rep_price()
                    .get_long_rep_price(rep as u32)
                    .get_price_with_len(len)
            }
            EncodeInstruction::Fresh(match_) => self
                .get_any_match_price(state, self.pos_state(pos))
                .get_normal_match_price()
                .get_price_with_dist_len(match_.distance, match_.len),
        }
    }
}

#[derive(Copy, Clone)]
pub struct AnyMatchPrice<'a> {
    price_calc: &'a EncoderPriceCalc<'a>,
    any_match_price: RangeEncPrice,
    state_idx: usize,
    pos_state: usize,
}

impl<'a> AnyMatchPrice<'a> {
    pub fn price(self) -> RangeEncPrice {
        self.any_match_price
    }

    pub fn get_normal_match_price(self) -> NormalMatchPrice<'a> {
        let is_rep_price = &self.price_calc.codec.is_rep_probs[self.state_idx];
        NormalMatchPrice {
            price_calc: self.price_calc,
            normal_match_price: self.any_match_price + is_rep_price.get_bit_price(0),
            pos_state: self.pos_state,
        }
    }

    pub fn get_any_rep_price(self) -> AnyRepPrice<'a> {
        let is_rep_price = &self.price_calc.codec.is_rep_probs[self.state_idx];
        AnyRepPrice {
            price_calc: self.price_calc,
            any_rep_price: self.any_match_price + is_rep_price.get_bit_price(1),
            state_idx: self.state_idx,
            pos_state: self.pos_state,
        }
    }
}

#[derive(Copy, Clone)]
pub struct NormalMatchPrice<'a> {
    price_calc: &'a EncoderPriceCalc<'a>,
    normal_match_price: RangeEncPrice,
    pos_state: usize,
}

impl<'a> NormalMatchPrice<'a> {
    pub fn price(self) -> RangeEncPrice {
        self.normal_match_price
    }

    pub fn get_price_with_dist_len(self, dist: u32, len: u32) -> RangeEncPrice {
        self.normal_match_price
            + self
                .price_calc
                .match_len_encoder
                .get_price(len, self.pos_state as u32)
            + self.price_calc.dist_encoder.get_price(dist, len)
    }
}

#[derive(Copy, Clone)]
pub struct AnyRepPrice<'a> {
    price_calc: &'a EncoderPriceCalc<'a>,
    any_rep_price: RangeEncPrice,
    state_idx: usize,
    pos_state: usize,
}

impl<'a> AnyRepPrice<'a> {
    pub fn price(self) -> RangeEncPrice {
        self.any_rep_price
    }

    pub fn get_short_rep_price(self) -> RangeEncPrice {
        let is_rep0_price = &self.price_calc.codec.is_rep0_probs[self.state_idx];
        let is_rep0_long_price =
            &self.price_calc.codec.is_rep0_long_probs[self.state_idx][self.pos_state];

        self.any_rep_price + is_rep0_price.get_bit_price(0) + is_rep0_long_price.get_bit_price(0)
    }

    pub fn get_long_rep_price(self, rep: u32) -> LongRepPrice<'a> {
        let is_rep0_price = &self.price_calc.codec.is_rep0_probs[self.state_idx];
        let is_rep0_long_price =
            &self.price_calc.codec.is_rep0_long_probs[self.state_idx][self.pos_state];
        let is_rep1_price = &self.price_calc.codec.is_rep1_probs[self.state_idx];

        let mut price = self.any_rep_price;

        if rep == 0 {
            price += is_rep0_price.get_bit_price(0) + is_rep0_long_price.get_bit_price(1);
        } else {
            price += is_rep0_price.get_bit_price(1);

            if rep == 1 {
                price += is_rep1_price.get_bit_price(0);
            } else {
                let is_rep2_price = &self.price_calc.codec.is_rep2_probs[self.state_idx];
                price += is_rep1_price.get_bit_price(1) + is_rep2_price.get_bit_price(rep - 2);
            }
        }

        LongRepPrice {
            price_calc: self.price_calc,
            long_rep_price: price,
            pos_state: self.pos_state,
        }
    }
}

#[derive(Copy, Clone)]
pub struct LongRepPrice<'a> {
    price_calc: &'a EncoderPriceCalc<'a>,
    long_rep_price: RangeEncPrice,
    pos_state: usize,
}

impl<'a> LongRepPrice<'a> {
    pub fn price(&self) -> RangeEncPrice {
        self.long_rep_price
    }

    pub fn get_price_with_len(&self, len: u32) -> RangeEncPrice {
        self.long_rep_price
            + self
                .price_calc
                .rep_len_encoder
                .get_price(len, self.pos_state as u32)
    }
}
