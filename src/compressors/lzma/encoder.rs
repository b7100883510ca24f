//! The streaming LZMA encoder.
//!
//! Bytes are appended into a bounded window and coded as soon as enough lookahead is
//! buffered for the longest possible match. Closing the encoder codes the remaining bytes,
//! optionally followed by the end marker, and flushes the range coder.

use std::io::{self, Write};

use tracing::debug;

use crate::error::Result;

use super::{
    codecs::{
        length_codec::{MATCH_LEN_MAX, MATCH_LEN_MIN},
        lzma_stream_codec::{
            encoders::{match_finding::MatchFinder, LZMAEncoderInput},
            prices::EncoderPriceCalc,
            LZMACodecEncoder,
        },
        range_codec::RangeEncoder,
    },
    options::EncoderOptions,
};

/// Lookahead kept buffered between writes, so a match finder always sees a full length
/// match past any position that gets coded before the input ends.
pub const RETAINED_LOOKAHEAD: usize = 2 * (MATCH_LEN_MAX + MATCH_LEN_MIN - 1);

/// How many bytes may be buffered ahead of the encode position.
const MAX_FORWARDS_BYTES: u32 = MATCH_LEN_MAX as u32 * 20;

pub struct LzmaEncoder<W: Write, M: MatchFinder> {
    rc: RangeEncoder<W>,
    codec: LZMACodecEncoder,
    input: LZMAEncoderInput<M>,
    options: EncoderOptions,
}

impl<W: Write, M: MatchFinder> LzmaEncoder<W, M> {
    pub fn new(output: W, options: EncoderOptions, match_finder: M) -> Result<Self> {
        options.validate()?;

        let props = options.properties;
        debug!(
            lc = props.lc,
            lp = props.lp,
            pb = props.pb,
            dict_size = options.dict_size,
            nice_len = options.nice_len,
            end_marker = options.end_marker,
            "creating lzma encoder"
        );

        Ok(Self {
            rc: RangeEncoder::new(output),
            codec: LZMACodecEncoder::new(props)?,
            input: LZMAEncoderInput::new(match_finder, options.dict_size, MAX_FORWARDS_BYTES),
            options,
        })
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Number of bytes coded so far.
    pub fn position(&self) -> u64 {
        self.input.pos()
    }

    /// Number of bytes appended but not coded yet.
    pub fn buffered_len(&self) -> usize {
        self.input.forward_bytes()
    }

    pub fn match_finder(&self) -> &M {
        self.input.match_finder()
    }

    pub fn prices(&self) -> EncoderPriceCalc<'_> {
        self.codec.prices()
    }

    /// Buffers as much of `data` as fits, returning how many bytes were taken.
    ///
    /// Nothing is coded until [`encode`](Self::encode) is called.
    pub fn append(&mut self, data: &[u8]) -> usize {
        self.input.append_data(data)
    }

    /// Codes buffered bytes until only [`RETAINED_LOOKAHEAD`] remain.
    pub fn encode(&mut self) -> Result<()> {
        self.encode_until(RETAINED_LOOKAHEAD)
    }

    fn encode_until(&mut self, retained: usize) -> Result<()> {
        while self.input.forward_bytes() > retained {
            self.codec
                .encode_one_packet(&mut self.rc, &mut self.input)?;
        }
        Ok(())
    }

    /// Codes every buffered byte and flushes the range coder, leaving the output byte aligned.
    ///
    /// The models carry over, so the next bytes continue the same stream in a new range
    /// coder segment.
    pub fn flush_and_align(&mut self) -> Result<()> {
        self.encode_until(0)?;
        self.rc.flush()?;

        debug!(
            pos = self.input.pos(),
            bytes_out = self.rc.bytes_written(),
            "flushed lzma encoder"
        );
        Ok(())
    }

    /// Codes every buffered byte, ends the range coder segment, and starts over: empty
    /// window, position 0, initial coding state and reps, untrained models.
    ///
    /// Whatever is written afterwards codes exactly like the output of a new encoder.
    pub fn reset(&mut self) -> Result<()> {
        self.flush_and_align()?;

        self.codec.reset();
        self.input.reset();

        debug!(bytes_out = self.rc.bytes_written(), "reset lzma encoder");
        Ok(())
    }

    /// Codes everything that's left, writes the end marker if enabled, and returns the output.
    pub fn close(mut self) -> Result<W> {
        self.encode_until(0)?;

        if self.options.end_marker {
            self.codec
                .encode_end_marker(&mut self.rc, self.input.pos())?;
        }

        let bytes_in = self.input.pos();
        let bytes_out = self.rc.pending_len();
        let output = self.rc.finish()?;

        debug!(bytes_in, bytes_out, "closed lzma encoder");
        Ok(output)
    }
}

impl<W: Write, M: MatchFinder> Write for LzmaEncoder<W, M> {
    /// Codes whatever is past the retained lookahead, then buffers as much of `buf` as fits.
    ///
    /// Coding happens before anything is taken from `buf`, so an error means nothing was
    /// accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encode()?;
        Ok(self.append(buf))
    }

    /// Flushes the output writer. Bytes still held by the encoder stay there.
    fn flush(&mut self) -> io::Result<()> {
        self.rc.inner().flush()
    }
}

/// Compresses `data` into a complete `.lzma` file: header followed by the stream.
pub fn compress<M: MatchFinder>(
    data: &[u8],
    options: EncoderOptions,
    match_finder: M,
) -> Result<Vec<u8>> {
    options.validate()?;

    let mut output = Vec::with_capacity(data.len() / 2 + 64);
    options.header(data.len() as u64).write(&mut output)?;

    let mut encoder = LzmaEncoder::new(output, options, match_finder)?;

    let mut written = 0;
    while written < data.len() {
        written += encoder.append(&data[written..]);
        encoder.encode()?;
    }

    encoder.close()
}
