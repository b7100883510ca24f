//! A brute force match finder, which searches for matches by comparing the bytes at the
//! encode position with every position in the history buffer.
//!
//! It's slow, but simple enough to be obviously correct, which makes it a good reference
//! for the encoder itself.

use crate::compressors::lzma::codecs::length_codec::{MATCH_LEN_MAX, MATCH_LEN_MIN};

use super::super::super::{data_buffers::EncoderDataBuffer, prices::EncoderPriceCalc};
use super::super::EncodeInstruction;
use super::{Match, MatchFinder};

#[derive(Debug, Clone)]
pub struct BruteForceMatchFinder {
    nice_len: u32,
    search_depth: u32,
}

impl BruteForceMatchFinder {
    /// `nice_len` is the length at which the search stops early, `search_depth` is how many
    /// distances are tried at most.
    pub fn new(nice_len: u32, search_depth: u32) -> Self {
        Self {
            nice_len: nice_len.clamp(MATCH_LEN_MIN as u32, MATCH_LEN_MAX as u32),
            search_depth,
        }
    }

    /// The longest repeat of a rep distance, preferring lower indices on ties.
    fn find_rep(
        &self,
        buffer: &EncoderDataBuffer,
        prices: &EncoderPriceCalc,
        max_len: u32,
    ) -> Option<(usize, u32)> {
        let history = buffer.history_len();
        let mut best: Option<(usize, u32)> = None;

        for (index, &rep) in prices.reps().as_array().iter().enumerate() {
            if rep >= history {
                continue;
            }

            let len = buffer.get_match_length(0, rep, max_len);
            if len >= MATCH_LEN_MIN as u32 && best.map_or(true, |(_, best_len)| len > best_len) {
                best = Some((index, len));
            }
        }

        best
    }

    /// The longest match anywhere in the searched history, preferring closer distances on ties.
    fn find_fresh(&self, buffer: &EncoderDataBuffer, max_len: u32) -> Match {
        let first = buffer.get_byte(0);
        let mut best = Match::NONE;

        for distance in 0..buffer.history_len().min(self.search_depth) {
            if buffer.get_history_byte(distance) != first {
                continue;
            }

            let len = buffer.get_match_length(1, distance, max_len);
            if len > best.len {
                best = Match { distance, len };
                if len >= self.nice_len {
                    break;
                }
            }
        }

        if best.len < MATCH_LEN_MIN as u32 {
            return Match::NONE;
        }
        best
    }
}

/// `a_price / a_len < b_price / b_len`, without the rounding.
fn cheaper_per_byte(a_price: u32, a_len: u32, b_price: u32, b_len: u32) -> bool {
    (a_price as u64) * (b_len as u64) < (b_price as u64) * (a_len as u64)
}

impl MatchFinder for BruteForceMatchFinder {
    fn find_match(&mut self, buffer: &EncoderDataBuffer, prices: &EncoderPriceCalc) -> Match {
        let max_len = (buffer.forwards_bytes() as u32).min(MATCH_LEN_MAX as u32);
        if buffer.is_empty() || max_len < MATCH_LEN_MIN as u32 {
            return Match::NONE;
        }

        let rep = self.find_rep(buffer, prices, max_len);
        if let Some((index, len)) = rep {
            if len >= self.nice_len {
                return Match {
                    distance: prices.reps().get(index),
                    len,
                };
            }
        }

        let fresh = self.find_fresh(buffer, max_len);

        let mut candidates = Vec::with_capacity(2);
        if let Some((index, len)) = rep {
            candidates.push((
                Match {
                    distance: prices.reps().get(index),
                    len,
                },
                EncodeInstruction::long_rep(index, len),
            ));
        }
        if !fresh.is_none() {
            candidates.push((fresh, EncodeInstruction::Fresh(fresh)));
        }

        // A match only wins if it costs less per byte than coding the current byte as a literal
        let literal_kind = if prices.state().is_literal() {
            EncodeInstruction::Literal
        } else {
            EncodeInstruction::DeltaLiteral
        };
        let mut best = Match::NONE;
        let mut best_price = prices.get_instruction_price(&literal_kind, buffer).value();
        let mut best_len = 1;

        for (match_, instruction) in candidates {
            let price = prices.get_instruction_price(&instruction, buffer).value();
            if cheaper_per_byte(price, match_.len, best_price, best_len) {
                best = match_;
                best_price = price;
                best_len = match_.len;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressors::lzma::codecs::{
        header_codec::LzmaProperties, lzma_stream_codec::LZMACodecEncoder,
    };

    fn buffer_at(data: &[u8], pos: u32) -> EncoderDataBuffer {
        let mut buffer = EncoderDataBuffer::new(1 << 16, 1 << 12);
        buffer.append_data(data);
        buffer.skip(pos);
        buffer
    }

    #[test]
    fn test_finds_longest_match() {
        let data = b"abcdefgh_abcd_abcdefg_abcdefgh";
        let buffer = buffer_at(data, 22);

        let codec = LZMACodecEncoder::new(LzmaProperties::default()).unwrap();
        let mut finder = BruteForceMatchFinder::new(273, 1 << 16);
        let found = finder.find_match(&buffer, &codec.prices());

        assert_eq!(found, Match { distance: 21, len: 8 });
    }

    #[test]
    fn test_nothing_at_stream_start() {
        let buffer = buffer_at(b"aaaa", 0);

        let codec = LZMACodecEncoder::new(LzmaProperties::default()).unwrap();
        let mut finder = BruteForceMatchFinder::new(64, 1 << 16);
        assert!(finder.find_match(&buffer, &codec.prices()).is_none());
    }

    #[test]
    fn test_short_matches_lose_to_literals() {
        // Only a 2 byte match far back is available, which costs more than 2 untrained literals
        let mut data = b"xy".to_vec();
        data.extend((0..2000u32).map(|i| (i % 50 + 150) as u8));
        data.extend_from_slice(b"xy");
        let buffer = buffer_at(&data, 2002);

        let codec = LZMACodecEncoder::new(LzmaProperties::default()).unwrap();
        let mut finder = BruteForceMatchFinder::new(64, 1 << 16);
        assert!(finder.find_match(&buffer, &codec.prices()).is_none());
    }

    #[test]
    fn test_nice_len_stops_search() {
        let data = b"0123456789_0123_0123456789";
        let buffer = buffer_at(data, 16);

        let codec = LZMACodecEncoder::new(LzmaProperties::default()).unwrap();

        // The closest copy is found first and is already long enough
        let mut finder = BruteForceMatchFinder::new(4, 1 << 16);
        let found = finder.find_match(&buffer, &codec.prices());
        assert_eq!(found, Match { distance: 4, len: 4 });

        let mut finder = BruteForceMatchFinder::new(64, 1 << 16);
        let found = finder.find_match(&buffer, &codec.prices());
        assert_eq!(found, Match { distance: 15, len: 10 });
    }

    #[test]
    fn test_search_depth_limits_distance() {
        let data = b"abcdefgh________abcdefgh";
        let buffer = buffer_at(data, 16);

        let codec = LZMACodecEncoder::new(LzmaProperties::default()).unwrap();
        let mut finder = BruteForceMatchFinder::new(64, 8);
        assert!(finder.find_match(&buffer, &codec.prices()).is_none());

        let mut finder = BruteForceMatchFinder::new(64, 16);
        assert_eq!(
            finder.find_match(&buffer, &codec.prices()),
            Match { distance: 15, len: 8 }
        );
    }
}
