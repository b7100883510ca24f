use super::super::super::{data_buffers::EncoderDataBuffer, prices::EncoderPriceCalc};
use super::{Match, MatchFinder};

/// Never finds a match. Every byte becomes a literal, or a short rep when it repeats rep0.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralOnlyMatchFinder;

impl LiteralOnlyMatchFinder {
    pub fn new() -> Self {
        Self
    }
}

impl MatchFinder for LiteralOnlyMatchFinder {
    fn find_match(&mut self, _buffer: &EncoderDataBuffer, _prices: &EncoderPriceCalc) -> Match {
        Match::NONE
    }
}
