use std::io::{Error, Write};

use crate::hash::Checksum;
use crate::png::raw::ChunkRaw;
use crate::png::SIGNATURE;

pub struct ChunkBuilder<W: Write> {
    inner: W,
}

// This is the high level writer interface
impl<W: Write> ChunkBuilder<W> {
    pub fn new(writer: W) -> Self {
        ChunkBuilder { inner: writer }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn write_signature(&mut self) -> Result<usize, Error> {
        self.inner.write_all(&SIGNATURE)?;
        Ok(SIGNATURE.len())
    }

    // The crc is always recomputed, never copied from a source chunk
    pub fn write(&mut self, chunk_type: &[u8; 4], data: &[u8]) -> Result<usize, Error> {
        let data_len = (data.len() as u32).to_be_bytes();
        let crc = {
            let mut hash = Checksum::new();
            hash.update(chunk_type);
            hash.update(data);
            hash.finalize()
        };

        self.inner.write_all(&data_len)?;
        self.inner.write_all(chunk_type)?;
        self.inner.write_all(data)?;
        self.inner.write_all(&crc.to_be_bytes())?;

        Ok(data_len.len() + chunk_type.len() + data.len() + 4)
    }

    pub fn write_chunk(&mut self, chunk: &ChunkRaw) -> Result<usize, Error> {
        self.write(&chunk.typ, &chunk.data)
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush()
    }
}
