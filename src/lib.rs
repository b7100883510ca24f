//! An LZMA encoder core: an adaptive binary range coder, the literal, length and distance
//! coders built on it, and the packet state machine that turns matches into a bitstream
//! any LZMA decoder can read.
//!
//! Finding good matches is left to a [`MatchFinder`](compressors::lzma::MatchFinder).
//! Two simple ones are included, one that never matches and a brute force search.

pub mod compressors;
pub mod error;
mod utils;

pub use compressors::lzma::{
    compress, BruteForceMatchFinder, EncoderOptions, LiteralOnlyMatchFinder, LzmaEncoder,
    LzmaHeader, LzmaProperties, Match, MatchFinder,
};
pub use error::{Error, Result};
