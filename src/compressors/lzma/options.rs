use crate::error::{Error, Result};

use super::codecs::{
    header_codec::{validate_dict_size, LzmaHeader, LzmaProperties, UNKNOWN_UNCOMPRESSED_SIZE},
    length_codec::{MATCH_LEN_MAX, MATCH_LEN_MIN},
    lzma_stream_codec::encoders::match_finding::BruteForceMatchFinder,
};

pub const DEFAULT_DICT_SIZE: u32 = 1 << 20;
pub const DEFAULT_NICE_LEN: u32 = 64;
pub const DEFAULT_DEPTH_LIMIT: u32 = 4096;

/// Everything needed to set up an [`LzmaEncoder`](super::encoder::LzmaEncoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    pub properties: LzmaProperties,
    pub dict_size: u32,
    /// Match length at which match finders stop looking for a longer one.
    pub nice_len: u32,
    /// How many candidate distances a match finder may try per position.
    pub depth_limit: u32,
    /// Terminate the stream with an end marker instead of relying on a known size.
    pub end_marker: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            properties: LzmaProperties::default(),
            dict_size: DEFAULT_DICT_SIZE,
            nice_len: DEFAULT_NICE_LEN,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            end_marker: false,
        }
    }
}

impl EncoderOptions {
    pub fn validate(&self) -> Result<()> {
        self.properties.validate()?;
        validate_dict_size(self.dict_size)?;

        if !(MATCH_LEN_MIN as u32..=MATCH_LEN_MAX as u32).contains(&self.nice_len) {
            return Err(Error::InvalidNiceLen(self.nice_len));
        }

        Ok(())
    }

    pub fn with_properties(mut self, properties: LzmaProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_dict_size(mut self, dict_size: u32) -> Self {
        self.dict_size = dict_size;
        self
    }

    pub fn with_nice_len(mut self, nice_len: u32) -> Self {
        self.nice_len = nice_len;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: u32) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn with_end_marker(mut self, end_marker: bool) -> Self {
        self.end_marker = end_marker;
        self
    }

    /// A brute force match finder searching as far back as these options allow.
    pub fn brute_force_match_finder(&self) -> BruteForceMatchFinder {
        BruteForceMatchFinder::new(self.nice_len, self.depth_limit.min(self.dict_size))
    }

    /// The `.lzma` header for a stream of `uncompressed_size` bytes.
    ///
    /// With the end marker enabled the size is always written as unknown.
    pub fn header(&self, uncompressed_size: u64) -> LzmaHeader {
        LzmaHeader {
            props: self.properties,
            dict_size: self.dict_size,
            uncompressed_size: if self.end_marker {
                UNKNOWN_UNCOMPRESSED_SIZE
            } else {
                uncompressed_size
            },
        }
    }
}
