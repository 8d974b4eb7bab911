use std::io::Read;

use log::debug;

use crate::png::meta::extract_text_key;
use crate::png::raw::{ChunkError, ChunkRaw, ChunkReaderRaw};
use crate::png::{IEND, TEXT, TIME};

// Only the chunk kinds the rewriter acts upon get their own variant, every
// other type is carried through untouched in `Other`.
#[derive(Debug, PartialEq, Eq)]
pub enum PngEntry {
    Text { key: String, chunk: ChunkRaw },
    Time { chunk: ChunkRaw },
    End { chunk: ChunkRaw },
    Other { chunk: ChunkRaw },
}

impl PngEntry {
    pub fn classify(chunk: ChunkRaw) -> Result<PngEntry, ChunkError> {
        match chunk.typ {
            TEXT => {
                let key = extract_text_key(&chunk.data)?;
                Ok(PngEntry::Text { key, chunk })
            }
            TIME => Ok(PngEntry::Time { chunk }),
            IEND => Ok(PngEntry::End { chunk }),
            _ => Ok(PngEntry::Other { chunk }),
        }
    }

    pub fn chunk(&self) -> &ChunkRaw {
        match self {
            PngEntry::Text { chunk, .. }
            | PngEntry::Time { chunk }
            | PngEntry::End { chunk }
            | PngEntry::Other { chunk } => chunk,
        }
    }
}

pub struct ChunkReader<R: Read> {
    inner: ChunkReaderRaw<R>,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(reader: R) -> Self {
        ChunkReader {
            inner: ChunkReaderRaw::new(reader),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    pub fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }

    pub fn read_entry(&mut self) -> Result<Option<PngEntry>, ChunkError> {
        match self.inner.read_chunk()? {
            None => Ok(None),
            Some(chunk) => {
                debug!("{} <{} bytes>", chunk.type_str(), chunk.data.len());
                PngEntry::classify(chunk).map(Some)
            }
        }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<PngEntry, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_entry().transpose()
    }
}
