use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

pub const DICT_SIZE_MIN: u32 = 4096;
pub const DICT_SIZE_MAX: u32 = u32::MAX & !15u32;

pub const LC_MAX: u32 = 8;
pub const LP_MAX: u32 = 4;
pub const PB_MAX: u32 = 4;

/// Uncompressed size stored in the header when the stream is terminated by an end marker.
pub const UNKNOWN_UNCOMPRESSED_SIZE: u64 = u64::MAX;

/// The three LZMA context parameters.
///
/// - `lc`: how many high bits of the previous byte select the literal coder
/// - `lp`: how many low bits of the position select the literal coder
/// - `pb`: how many low bits of the position select the pos_state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LzmaProperties {
    pub lc: u32,
    pub lp: u32,
    pub pb: u32,
}

impl Default for LzmaProperties {
    fn default() -> Self {
        Self {
            lc: 3,
            lp: 0,
            pb: 2,
        }
    }
}

impl LzmaProperties {
    pub fn new(lc: u32, lp: u32, pb: u32) -> Result<Self> {
        let props = Self { lc, lp, pb };
        props.validate()?;
        Ok(props)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lc > LC_MAX || self.lp > LP_MAX || self.pb > PB_MAX {
            return Err(Error::InvalidProperties {
                lc: self.lc,
                lp: self.lp,
                pb: self.pb,
            });
        }
        Ok(())
    }

    pub fn pos_mask(&self) -> u32 {
        (1 << self.pb) - 1
    }

    /// The classic single byte encoding, `(pb * 5 + lp) * 9 + lc`.
    pub fn to_byte(&self) -> u8 {
        ((self.pb * 5 + self.lp) * 9 + self.lc) as u8
    }

    pub fn from_byte(props: u8) -> Result<Self> {
        let invalid = || Error::InvalidProperties {
            lc: props as u32 % 9,
            lp: (props as u32 / 9) % 5,
            pb: props as u32 / 45,
        };

        if props as u32 > (PB_MAX * 5 + LP_MAX) * 9 + LC_MAX {
            return Err(invalid());
        }

        let props = props as u32;
        let pb = props / (9 * 5);
        let props = props - pb * 9 * 5;
        let lp = props / 9;
        let lc = props - lp * 9;

        Self::new(lc, lp, pb)
    }
}

pub fn validate_dict_size(dict_size: u32) -> Result<()> {
    if !(DICT_SIZE_MIN..=DICT_SIZE_MAX).contains(&dict_size) {
        return Err(Error::InvalidDictionarySize(dict_size));
    }
    Ok(())
}

/// The 13 byte `.lzma` header: properties byte, dictionary size, uncompressed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzmaHeader {
    pub props: LzmaProperties,
    pub dict_size: u32,
    pub uncompressed_size: u64,
}

impl LzmaHeader {
    pub const SIZE: usize = 13;

    pub fn write(&self, mut writer: impl Write) -> Result<()> {
        self.props.validate()?;
        validate_dict_size(self.dict_size)?;

        writer.write_u8(self.props.to_byte())?;
        writer.write_u32::<LittleEndian>(self.dict_size)?;
        writer.write_u64::<LittleEndian>(self.uncompressed_size)?;
        Ok(())
    }

    pub fn parse(mut reader: impl Read) -> Result<Self> {
        let props = LzmaProperties::from_byte(reader.read_u8()?)?;
        let dict_size = reader.read_u32::<LittleEndian>()?;
        let uncompressed_size = reader.read_u64::<LittleEndian>()?;

        validate_dict_size(dict_size)?;

        Ok(LzmaHeader {
            props,
            dict_size,
            uncompressed_size,
        })
    }

    pub fn has_end_marker(&self) -> bool {
        self.uncompressed_size == UNKNOWN_UNCOMPRESSED_SIZE
    }
}
