use super::super::{data_buffers::EncoderDataBuffer, prices::EncoderPriceCalc};

mod brute_force;
mod literal_only;

pub use brute_force::BruteForceMatchFinder;
pub use literal_only::LiteralOnlyMatchFinder;

/// A back reference: copy `len` bytes starting `distance + 1` bytes behind the current position.
///
/// A `len` of 0 means no match was found, and the encoder codes a literal (or a short rep).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Match {
    pub distance: u32,
    pub len: u32,
}

impl Match {
    pub const NONE: Match = Match {
        distance: 0,
        len: 0,
    };

    pub fn is_none(&self) -> bool {
        self.len == 0
    }
}

/// Picks what to code at the current position of the window.
///
/// The returned match must refer to bytes inside the window's history
/// (`distance < history_len()`), may not run past the buffered bytes or 273, and may only
/// have length 1 if its distance is rep0. The encoder rejects anything else.
pub trait MatchFinder {
    fn find_match(&mut self, buffer: &EncoderDataBuffer, prices: &EncoderPriceCalc) -> Match;

    /// Called before the encode position moves `len` bytes past the current one.
    fn skip(&mut self, _buffer: &EncoderDataBuffer, _len: u32) {}

    /// Called when the window is emptied and the encode position starts over at 0.
    fn reset(&mut self) {}
}

impl<M: MatchFinder + ?Sized> MatchFinder for Box<M> {
    fn find_match(&mut self, buffer: &EncoderDataBuffer, prices: &EncoderPriceCalc) -> Match {
        (**self).find_match(buffer, prices)
    }

    fn skip(&mut self, buffer: &EncoderDataBuffer, len: u32) {
        (**self).skip(buffer, len)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
