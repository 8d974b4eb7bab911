use std::io::{ErrorKind, Read};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::trace;
use thiserror::Error;

use crate::buf::fill_buf;
use crate::png::{MAX_CHUNK_LENGTH, SIGNATURE};

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("invalid PNG signature: {0:02X?}")]
    InvalidSignature(Vec<u8>),
    #[error("stream ended in the middle of a chunk")]
    Truncated,
    #[error("chunk length {0} exceeds 2^31 - 1")]
    LengthOverflow(u32),
    #[error("tEXt chunk has no keyword separator")]
    MalformedText,
    #[error("stream ended before IEND")]
    MissingEnd,
}

// A short read inside of a chunk frame is a truncated stream, not an IO failure
fn truncated(e: std::io::Error) -> ChunkError {
    if e.kind() == ErrorKind::UnexpectedEof {
        ChunkError::Truncated
    } else {
        ChunkError::IO(e)
    }
}

pub fn has_signature(data: &[u8]) -> bool {
    data.len() >= SIGNATURE.len() && data[..SIGNATURE.len()] == SIGNATURE
}

// Consumes the signature, a short stream is reported as an invalid signature
pub fn read_signature<R: Read>(reader: &mut R) -> Result<[u8; 8], ChunkError> {
    let mut sig = [0u8; 8];
    let (_, len) = fill_buf(reader, &mut sig)?;

    if has_signature(&sig[..len]) {
        trace!("PNG signature ok");
        Ok(sig)
    } else {
        Err(ChunkError::InvalidSignature(sig[..len].to_vec()))
    }
}

// The crc is kept verbatim from the source, it is never checked
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ChunkRaw {
    pub typ: [u8; 4],
    pub data: Vec<u8>,
    pub crc: u32,
}

impl ChunkRaw {
    pub fn type_str(&self) -> String {
        String::from_utf8_lossy(&self.typ).into_owned()
    }
}

pub struct ChunkReaderRaw<R: Read> {
    inner: R,
}

impl<R: Read> ChunkReaderRaw<R> {
    pub fn new(reader: R) -> Self {
        ChunkReaderRaw { inner: reader }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    // Ok(None) only when the stream ends exactly on a chunk boundary
    pub fn read_chunk(&mut self) -> Result<Option<ChunkRaw>, ChunkError> {
        let len = {
            let mut len = [0u8; 4];
            match fill_buf(&mut self.inner, &mut len)? {
                (true, 0) => return Ok(None),
                (true, _) => return Err(ChunkError::Truncated),
                (false, _) => BigEndian::read_u32(&len),
            }
        };

        if len > MAX_CHUNK_LENGTH {
            return Err(ChunkError::LengthOverflow(len));
        }

        let typ = {
            let mut typ: [u8; 4] = [0; 4];
            self.inner.read_exact(&mut typ).map_err(truncated)?;
            typ
        };

        // Grow with the stream instead of trusting the length up front
        let data = {
            let mut data = Vec::new();
            (&mut self.inner)
                .take(u64::from(len))
                .read_to_end(&mut data)?;
            if data.len() != len as usize {
                return Err(ChunkError::Truncated);
            }
            data
        };

        let crc = self.inner.read_u32::<BigEndian>().map_err(truncated)?;

        Ok(Some(ChunkRaw { typ, data, crc }))
    }
}

impl<R: Read> Iterator for ChunkReaderRaw<R> {
    type Item = Result<ChunkRaw, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_chunk().transpose()
    }
}
