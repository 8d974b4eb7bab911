use time::format_description::{self, OwnedFormatItem};
use time::PrimitiveDateTime;
use thiserror::Error;

use crate::hash::Checksum;
use crate::png::raw::{ChunkError, ChunkRaw};
use crate::png::{TEXT, TIME};

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("tEXt keyword contains a NUL byte")]
    KeyContainsNul,
    #[error("tEXt keyword must be 1 to 79 bytes, got {0}")]
    KeywordLength(usize),
    #[error("{0:?} is not representable in Latin-1")]
    Unrepresentable(char),
    #[error("year {0} does not fit in a tIME chunk")]
    YearOutOfRange(i32),
    #[error(transparent)]
    Format(#[from] time::error::Format),
    #[error(transparent)]
    InvalidFormat(#[from] time::error::InvalidFormatDescription),
}

// Produced chunks carry a crc over `type || data` like the builder would write
fn produce(typ: [u8; 4], data: Vec<u8>) -> ChunkRaw {
    let crc = {
        let mut hash = Checksum::new();
        hash.update(&typ);
        hash.update(&data);
        hash.finalize()
    };
    ChunkRaw { typ, data, crc }
}

fn encode_latin1(text: &str, out: &mut Vec<u8>) -> Result<(), MetaError> {
    for c in text.chars() {
        let byte = u8::try_from(u32::from(c)).map_err(|_| MetaError::Unrepresentable(c))?;
        out.push(byte);
    }
    Ok(())
}

fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}

pub fn build_text_chunk(key: &str, value: &str) -> Result<ChunkRaw, MetaError> {
    let mut data = Vec::with_capacity(key.len() + 1 + value.len());

    encode_latin1(key, &mut data)?;
    if data.contains(&0) {
        return Err(MetaError::KeyContainsNul);
    }
    if data.is_empty() || data.len() > 79 {
        return Err(MetaError::KeywordLength(data.len()));
    }

    data.push(0);
    encode_latin1(value, &mut data)?;

    Ok(produce(TEXT, data))
}

pub fn build_time_chunk(time: &PrimitiveDateTime) -> Result<ChunkRaw, MetaError> {
    let year = u16::try_from(time.year()).map_err(|_| MetaError::YearOutOfRange(time.year()))?;

    let mut data = Vec::with_capacity(7);
    data.extend_from_slice(&year.to_be_bytes());
    data.push(u8::from(time.month()));
    data.push(time.day());
    data.push(time.hour());
    data.push(time.minute());
    data.push(time.second());

    Ok(produce(TIME, data))
}

// Only the keyword is decoded, the text after the separator is never looked at
pub fn extract_text_key(data: &[u8]) -> Result<String, ChunkError> {
    let sep = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(ChunkError::MalformedText)?;
    Ok(decode_latin1(&data[..sep]))
}

/// Renders the timestamp into the `Creation Time` text value.
///
/// Takes a `time` format description such as
/// `[year]:[month]:[day] [hour]:[minute]:[second].[subsecond digits:3]`.
#[derive(Debug, Clone)]
pub struct CreationTimeFormat(OwnedFormatItem);

impl CreationTimeFormat {
    pub fn parse(description: &str) -> Result<Self, MetaError> {
        Ok(CreationTimeFormat(format_description::parse_owned::<1>(
            description,
        )?))
    }

    pub fn render(&self, time: &PrimitiveDateTime) -> Result<String, MetaError> {
        Ok(time.format(&self.0)?)
    }
}
