pub mod codecs;
pub mod encoder;
pub mod options;

pub use self::codecs::{
    header_codec::{LzmaHeader, LzmaProperties},
    lzma_stream_codec::encoders::match_finding::{
        BruteForceMatchFinder, LiteralOnlyMatchFinder, Match, MatchFinder,
    },
};
pub use self::encoder::{compress, LzmaEncoder};
pub use self::options::EncoderOptions;
