//! A straightforward LZMA stream decoder, used by the tests to check what the encoder wrote.

use std::io::{self, Cursor, Read};

use crate::compressors::lzma::codecs::{
    header_codec::LzmaProperties, length_codec::LengthCodecDecoder,
    literals_codec::LiteralCodecDecoder, range_codec::RangeDecoder,
};
use crate::error::Result;

use super::{distance::DistanceCodecDecoder, LZMACodec, END_MARKER_DISTANCE};

/// What a single decoded packet was, so tests can check which emit path was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodedPacket {
    Literal(u8),
    ShortRep,
    Rep { index: usize, len: u32 },
    Fresh { distance: u32, len: u32 },
    EndMarker,
}

pub(crate) struct LZMACodecDecoder {
    codec: LZMACodec,

    literal_decoder: LiteralCodecDecoder,
    match_len_decoder: LengthCodecDecoder,
    rep_len_decoder: LengthCodecDecoder,
    dist_decoder: DistanceCodecDecoder,
}

fn invalid_data(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

impl LZMACodecDecoder {
    pub fn new(props: LzmaProperties) -> Result<Self> {
        props.validate()?;

        Ok(Self {
            codec: LZMACodec::new(props.pb),

            literal_decoder: LiteralCodecDecoder::new(props.lc, props.lp),
            match_len_decoder: LengthCodecDecoder::new(props.pb)?,
            rep_len_decoder: LengthCodecDecoder::new(props.pb)?,
            dist_decoder: DistanceCodecDecoder::new()?,
        })
    }

    /// Decodes a whole stream. Without a `known_len` the stream has to end with the end marker.
    pub fn decode_stream(
        &mut self,
        data: &[u8],
        known_len: Option<u64>,
    ) -> io::Result<(Vec<u8>, Vec<DecodedPacket>)> {
        let mut output = Vec::new();
        let packets = self.decode_segment(data, &mut output, known_len)?;
        Ok((output, packets))
    }

    /// Decodes one range coder segment, appending to `output` until it holds `end_len` bytes
    /// or the end marker is found. The models carry over between segments.
    pub fn decode_segment(
        &mut self,
        data: &[u8],
        output: &mut Vec<u8>,
        end_len: Option<u64>,
    ) -> io::Result<Vec<DecodedPacket>> {
        let mut rc = RangeDecoder::new_stream(Cursor::new(data))?;
        let mut packets = Vec::new();

        loop {
            if end_len.map_or(false, |len| output.len() as u64 >= len) {
                break;
            }

            let packet = self.decode_one_packet(&mut rc, output)?;
            packets.push(packet);
            if packet == DecodedPacket::EndMarker {
                break;
            }
        }

        if let Some(len) = end_len {
            if output.len() as u64 != len {
                return Err(invalid_data("stream ended at the wrong length"));
            }
        }

        Ok(packets)
    }

    pub fn decode_one_packet(
        &mut self,
        rc: &mut RangeDecoder<impl Read>,
        output: &mut Vec<u8>,
    ) -> io::Result<DecodedPacket> {
        let pos = output.len() as u64;
        let pos_state = self.codec.pos_state(pos);
        let state_idx = self.codec.state.get_idx();

        if rc.decode_bit(&mut self.codec.is_match_probs[state_idx][pos_state])? == 0 {
            return self.decode_literal(rc, output);
        }

        if rc.decode_bit(&mut self.codec.is_rep_probs[state_idx])? == 0 {
            let len = self.match_len_decoder.decode(rc, pos_state as u32)?;
            let distance = self.dist_decoder.decode(rc, len)?;

            self.codec.reps.push_fresh(distance);
            self.codec.state.update_match();

            if distance == END_MARKER_DISTANCE {
                return Ok(DecodedPacket::EndMarker);
            }

            copy_match(output, distance, len)?;
            return Ok(DecodedPacket::Fresh { distance, len });
        }

        let index = if rc.decode_bit(&mut self.codec.is_rep0_probs[state_idx])? == 0 {
            if rc.decode_bit(&mut self.codec.is_rep0_long_probs[state_idx][pos_state])? == 0 {
                self.codec.state.update_short_rep();
                copy_match(output, self.codec.reps.get(0), 1)?;
                return Ok(DecodedPacket::ShortRep);
            }
            0
        } else if rc.decode_bit(&mut self.codec.is_rep1_probs[state_idx])? == 0 {
            1
        } else {
            2 + rc.decode_bit(&mut self.codec.is_rep2_probs[state_idx])? as usize
        };

        let distance = self.codec.reps.promote(index);
        let len = self.rep_len_decoder.decode(rc, pos_state as u32)?;
        self.codec.state.update_long_rep();

        copy_match(output, distance, len)?;
        Ok(DecodedPacket::Rep { index, len })
    }

    fn decode_literal(
        &mut self,
        rc: &mut RangeDecoder<impl Read>,
        output: &mut Vec<u8>,
    ) -> io::Result<DecodedPacket> {
        let pos = output.len() as u64;
        let prev_byte = output.last().copied().unwrap_or(0);

        let byte = if self.codec.state.is_literal() {
            self.literal_decoder.decode(rc, prev_byte, pos)?
        } else {
            let match_byte = history_byte(output, self.codec.reps.get(0))?;
            self.literal_decoder
                .decode_delta(rc, prev_byte, pos, match_byte)?
        };

        output.push(byte);
        self.codec.state.update_literal();

        Ok(DecodedPacket::Literal(byte))
    }
}

fn history_byte(output: &[u8], distance: u32) -> io::Result<u8> {
    let back = distance as usize + 1;
    if back > output.len() {
        return Err(invalid_data("distance reaches before the output"));
    }
    Ok(output[output.len() - back])
}

fn copy_match(output: &mut Vec<u8>, distance: u32, len: u32) -> io::Result<()> {
    for _ in 0..len {
        let byte = history_byte(output, distance)?;
        output.push(byte);
    }
    Ok(())
}
