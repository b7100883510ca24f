pub mod data_buffers;
#[cfg(test)]
pub(crate) mod decoder;
pub mod distance;
pub mod encoders;
pub mod prices;
pub mod state;

use std::io::Write;

use tracing::trace;

use crate::error::{Error, Result};

use self::{
    data_buffers::EncoderDataBuffer,
    distance::DistanceCodecEncoder,
    encoders::{
        match_finding::{Match, MatchFinder},
        EncodeInstruction, LZMAEncoderInput,
    },
    prices::EncoderPriceCalc,
    state::{Reps, State, STATES},
};

use super::{
    header_codec::LzmaProperties,
    length_codec::{LengthCodecEncoder, MATCH_LEN_MAX, MATCH_LEN_MIN, POS_STATES_MAX},
    literals_codec::LiteralCodecEncoder,
    range_codec::{RangeEncProbability, RangeEncoder},
};

/// The distance the end of stream marker is coded with.
pub const END_MARKER_DISTANCE: u32 = u32::MAX;

/// The packet level models: coding state, rep distances and the control bit probabilities.
#[derive(Debug, Clone)]
pub struct LZMACodec {
    pos_mask: u32,
    state: State,
    reps: Reps,

    is_match_probs: [[RangeEncProbability; POS_STATES_MAX]; STATES],
    is_rep_probs: [RangeEncProbability; STATES],
    is_rep0_probs: [RangeEncProbability; STATES],
    is_rep1_probs: [RangeEncProbability; STATES],
    is_rep2_probs: [RangeEncProbability; STATES],
    is_rep0_long_probs: [[RangeEncProbability; POS_STATES_MAX]; STATES],
}

impl LZMACodec {
    pub fn new(pb: u32) -> Self {
        Self {
            pos_mask: (1 << pb) - 1,

            state: State::new(),
            reps: Reps::new(),

            is_match_probs: [[RangeEncProbability::new(); POS_STATES_MAX]; STATES],
            is_rep_probs: [RangeEncProbability::new(); STATES],
            is_rep0_probs: [RangeEncProbability::new(); STATES],
            is_rep1_probs: [RangeEncProbability::new(); STATES],
            is_rep2_probs: [RangeEncProbability::new(); STATES],
            is_rep0_long_probs: [[RangeEncProbability::new(); POS_STATES_MAX]; STATES],
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn reps(&self) -> &Reps {
        &self.reps
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.reps.reset();

        let probs = self
            .is_match_probs
            .iter_mut()
            .chain(self.is_rep0_long_probs.iter_mut())
            .flatten()
            .chain(self.is_rep_probs.iter_mut())
            .chain(self.is_rep0_probs.iter_mut())
            .chain(self.is_rep1_probs.iter_mut())
            .chain(self.is_rep2_probs.iter_mut());
        probs.for_each(|prob| prob.reset());
    }

    fn pos_state(&self, pos: u64) -> usize {
        (pos as u32 & self.pos_mask) as usize
    }
}

/// Turns matches into packets and codes them.
///
/// The encoder never searches for matches itself, it codes whatever the [`MatchFinder`] of
/// the input picks, after checking that the match can actually be decoded.
pub struct LZMACodecEncoder {
    codec: LZMACodec,

    literal_encoder: LiteralCodecEncoder,
    match_len_encoder: LengthCodecEncoder,
    rep_len_encoder: LengthCodecEncoder,
    dist_encoder: DistanceCodecEncoder,
}

impl LZMACodecEncoder {
    pub fn new(props: LzmaProperties) -> Result<Self> {
        props.validate()?;

        Ok(Self {
            codec: LZMACodec::new(props.pb),

            literal_encoder: LiteralCodecEncoder::new(props.lc, props.lp),
            match_len_encoder: LengthCodecEncoder::new(props.pb)?,
            rep_len_encoder: LengthCodecEncoder::new(props.pb)?,
            dist_encoder: DistanceCodecEncoder::new()?,
        })
    }

    pub fn state(&self) -> &State {
        self.codec.state()
    }

    pub fn reps(&self) -> &Reps {
        self.codec.reps()
    }

    /// Starts over with the initial coding state, zeroed reps and untrained models.
    pub fn reset(&mut self) {
        self.codec.reset();
        self.literal_encoder.reset();
        self.match_len_encoder.reset();
        self.rep_len_encoder.reset();
        self.dist_encoder.reset();
    }

    /// A read-only pricing view over the current models.
    pub fn prices(&self) -> EncoderPriceCalc<'_> {
        EncoderPriceCalc {
            codec: &self.codec,
            literal_encoder: &self.literal_encoder,
            match_len_encoder: &self.match_len_encoder,
            rep_len_encoder: &self.rep_len_encoder,
            dist_encoder: &self.dist_encoder,
        }
    }

    /// Decides which packet kind codes `match_` at the buffer's current position.
    ///
    /// A match that can't be coded there is rejected with [`Error::InvalidMatch`].
    pub fn classify(&self, match_: Match, buffer: &EncoderDataBuffer) -> Result<EncodeInstruction> {
        let reps = &self.codec.reps;

        if match_.is_none() {
            if !buffer.is_empty() && buffer.get_byte(0) == buffer.get_history_byte(reps.get(0)) {
                return Ok(EncodeInstruction::ShortRep);
            }

            return Ok(if self.codec.state.is_literal() {
                EncodeInstruction::Literal
            } else {
                EncodeInstruction::DeltaLiteral
            });
        }

        let invalid = |reason| Error::InvalidMatch {
            distance: match_.distance,
            len: match_.len,
            reason,
        };

        if match_.len > MATCH_LEN_MAX as u32 {
            return Err(invalid("longer than the maximum match length"));
        }
        if match_.len as usize > buffer.forwards_bytes() {
            return Err(invalid("runs past the end of the buffered data"));
        }
        if match_.distance >= buffer.history_len() {
            return Err(invalid("reaches behind the start of the history"));
        }
        if match_.len < MATCH_LEN_MIN as u32 && match_.distance != reps.get(0) {
            return Err(invalid("single byte matches must use rep0"));
        }
        if buffer.get_match_length(0, match_.distance, match_.len) < match_.len {
            return Err(invalid("bytes at the distance differ"));
        }

        if match_.len == 1 {
            return Ok(EncodeInstruction::ShortRep);
        }

        Ok(match reps.find(match_.distance) {
            Some(index) => EncodeInstruction::long_rep(index, match_.len),
            None => EncodeInstruction::Fresh(match_),
        })
    }

    /// Codes the next packet of `input`, returning how many bytes it covered.
    ///
    /// Returns 0 without coding anything if there is nothing buffered.
    pub fn encode_one_packet<M: MatchFinder>(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        input: &mut LZMAEncoderInput<M>,
    ) -> Result<u32> {
        if input.forward_bytes() == 0 {
            return Ok(0);
        }

        let match_ = input.find_match(&self.prices());
        let instruction = self.classify(match_, input.buffer())?;

        trace!(pos = input.pos(), ?instruction, "encoding packet");
        self.encode_instruction(rc, instruction, input.buffer())?;

        let len = instruction.length();
        input.skip(len);

        Ok(len)
    }

    /// Codes the end of stream marker. `pos` is the number of bytes coded before it.
    pub fn encode_end_marker(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        pos: u64,
    ) -> Result<()> {
        let pos_state = self.codec.pos_state(pos);
        let marker = Match {
            distance: END_MARKER_DISTANCE,
            len: MATCH_LEN_MIN as u32,
        };

        trace!(pos, "encoding end marker");
        self.encode_fresh_match(rc, marker, pos_state)
    }

    fn encode_instruction(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        instruction: EncodeInstruction,
        buffer: &EncoderDataBuffer,
    ) -> Result<()> {
        let pos = buffer.pos();
        let pos_state = self.codec.pos_state(pos);

        match instruction {
            EncodeInstruction::Literal => self.encode_literal(rc, buffer, pos_state),
            EncodeInstruction::DeltaLiteral => self.encode_delta_literal(rc, buffer, pos_state),
            EncodeInstruction::ShortRep => self.encode_short_rep(rc, pos_state),
            EncodeInstruction::Rep0Long { len }
            | EncodeInstruction::Rep1 { len }
            | EncodeInstruction::Rep2 { len }
            | EncodeInstruction::Rep3 { len } => {
                let rep = instruction.rep_index().unwrap_or(0);
                self.encode_long_rep(rc, rep, len, pos_state)
            }
            EncodeInstruction::Fresh(match_) => self.encode_fresh_match(rc, match_, pos_state),
        }
    }

    fn encode_literal(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        buffer: &EncoderDataBuffer,
        pos_state: usize,
    ) -> Result<()> {
        let state_idx = self.codec.state.get_idx();
        rc.encode_bit0(&mut self.codec.is_match_probs[state_idx][pos_state])?;

        self.literal_encoder
            .encode(rc, buffer.get_byte(0), buffer.prev_byte(), buffer.pos())?;

        self.codec.state.update_literal();
        Ok(())
    }

    fn encode_delta_literal(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        buffer: &EncoderDataBuffer,
        pos_state: usize,
    ) -> Result<()> {
        let state_idx = self.codec.state.get_idx();
        rc.encode_bit0(&mut self.codec.is_match_probs[state_idx][pos_state])?;

        let match_byte = buffer.get_history_byte(self.codec.reps.get(0));
        self.literal_encoder.encode_delta(
            rc,
            buffer.get_byte(0),
            buffer.prev_byte(),
            buffer.pos(),
            match_byte,
        )?;

        self.codec.state.update_literal();
        Ok(())
    }

    fn encode_short_rep(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        pos_state: usize,
    ) -> Result<()> {
        let state_idx = self.codec.state.get_idx();

        rc.encode_bit1(&mut self.codec.is_match_probs[state_idx][pos_state])?;
        rc.encode_bit1(&mut self.codec.is_rep_probs[state_idx])?;
        rc.encode_bit0(&mut self.codec.is_rep0_probs[state_idx])?;
        rc.encode_bit0(&mut self.codec.is_rep0_long_probs[state_idx][pos_state])?;

        self.codec.state.update_short_rep();
        Ok(())
    }

    fn encode_long_rep(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        rep: usize,
        len: u32,
        pos_state: usize,
    ) -> Result<()> {
        let state_idx = self.codec.state.get_idx();

        rc.encode_bit1(&mut self.codec.is_match_probs[state_idx][pos_state])?;
        rc.encode_bit1(&mut self.codec.is_rep_probs[state_idx])?;

        if rep == 0 {
            rc.encode_bit0(&mut self.codec.is_rep0_probs[state_idx])?;
            rc.encode_bit1(&mut self.codec.is_rep0_long_probs[state_idx][pos_state])?;
        } else {
            rc.encode_bit1(&mut self.codec.is_rep0_probs[state_idx])?;

            if rep == 1 {
                rc.encode_bit0(&mut self.codec.is_rep1_probs[state_idx])?;
            } else {
                rc.encode_bit1(&mut self.codec.is_rep1_probs[state_idx])?;
                rc.encode_bit(&mut self.codec.is_rep2_probs[state_idx], rep as u32 - 2)?;
            }

            self.codec.reps.promote(rep);
        }

        self.rep_len_encoder.encode(rc, len, pos_state as u32)?;
        self.codec.state.update_long_rep();
        Ok(())
    }

    fn encode_fresh_match(
        &mut self,
        rc: &mut RangeEncoder<impl Write>,
        match_: Match,
        pos_state: usize,
    ) -> Result<()> {
        let state_idx = self.codec.state.get_idx();

        rc.encode_bit1(&mut self.codec.is_match_probs[state_idx][pos_state])?;
        rc.encode_bit0(&mut self.codec.is_rep_probs[state_idx])?;

        self.match_len_encoder.encode(rc, match_.len, pos_state as u32)?;
        self.dist_encoder.encode(rc, match_.distance, match_.len)?;

        self.codec.reps.push_fresh(match_.distance);
        self.codec.state.update_match();
        Ok(())
    }
}
