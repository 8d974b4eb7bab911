use std::io::{Read, Write};

use log::{debug, trace};
use serde::Deserialize;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::png::builder::ChunkBuilder;
use crate::png::meta::{build_text_chunk, build_time_chunk, CreationTimeFormat, MetaError};
use crate::png::raw::{read_signature, ChunkError};
use crate::png::reader::{ChunkReader, PngEntry};
use crate::png::CREATION_TIME_KEY;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    #[error(transparent)]
    Meta(#[from] MetaError),
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RewriteOptions {
    // `time` format description for the `Creation Time` tEXt value, unset
    // or empty disables the tEXt chunk
    pub creation_time_format: Option<String>,
    pub add_time_chunk: bool,
}

// What was seen on the read side so far, only consulted at IEND
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSession {
    pub seen_text_creation_time: bool,
    pub seen_time: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSummary {
    pub chunks: usize,
    pub text_added: bool,
    pub time_added: bool,
}

// State machine enum
#[derive(Debug, Clone, Copy)]
enum Spo {
    ExpectSignature,
    Streaming(RewriteSession),
    Done,
}

pub struct Rewriter {
    text_format: Option<CreationTimeFormat>,
    add_time_chunk: bool,
}

impl Rewriter {
    pub fn new(options: &RewriteOptions) -> Result<Self, RewriteError> {
        let text_format = match options.creation_time_format.as_deref() {
            None | Some("") => None,
            Some(fmt) => Some(CreationTimeFormat::parse(fmt)?),
        };

        Ok(Rewriter {
            text_format,
            add_time_chunk: options.add_time_chunk,
        })
    }

    // On error the bytes already written to `dst` are not a valid PNG and
    // must be thrown away by the caller.
    pub fn rewrite<R: Read, W: Write>(
        &self,
        src: R,
        dst: W,
        time: &PrimitiveDateTime,
    ) -> Result<RewriteSummary, RewriteError> {
        let mut reader = ChunkReader::new(src);
        let mut builder = ChunkBuilder::new(dst);
        let mut summary = RewriteSummary::default();
        let mut state = Spo::ExpectSignature;

        loop {
            state = match state {
                Spo::ExpectSignature => {
                    read_signature(reader.get_mut())?;
                    builder.write_signature()?;
                    trace!("signature copied");
                    Spo::Streaming(RewriteSession::default())
                }

                Spo::Streaming(mut session) => {
                    let entry = reader.read_entry()?.ok_or(ChunkError::MissingEnd)?;

                    let next = match &entry {
                        PngEntry::Text { key, .. } => {
                            if key == CREATION_TIME_KEY {
                                session.seen_text_creation_time = true;
                            }
                            Spo::Streaming(session)
                        }
                        PngEntry::Time { .. } => {
                            session.seen_time = true;
                            Spo::Streaming(session)
                        }
                        PngEntry::End { .. } => {
                            self.insert(&mut builder, &session, time, &mut summary)?;
                            Spo::Done
                        }
                        PngEntry::Other { .. } => Spo::Streaming(session),
                    };

                    builder.write_chunk(entry.chunk())?;
                    summary.chunks += 1;
                    next
                }

                Spo::Done => break,
            };
        }

        builder.flush()?;
        Ok(summary)
    }

    // Both chunks are built before either is written so that a bad timestamp
    // never leaves a half inserted stream
    fn insert<W: Write>(
        &self,
        builder: &mut ChunkBuilder<W>,
        session: &RewriteSession,
        time: &PrimitiveDateTime,
        summary: &mut RewriteSummary,
    ) -> Result<(), RewriteError> {
        let text_chunk = match &self.text_format {
            Some(fmt) if !session.seen_text_creation_time => {
                Some(build_text_chunk(CREATION_TIME_KEY, &fmt.render(time)?)?)
            }
            _ => None,
        };
        let time_chunk = if self.add_time_chunk && !session.seen_time {
            Some(build_time_chunk(time)?)
        } else {
            None
        };

        if let Some(chunk) = text_chunk {
            debug!("insert tEXt <{} bytes>", chunk.data.len());
            builder.write_chunk(&chunk)?;
            summary.text_added = true;
        }
        if let Some(chunk) = time_chunk {
            debug!("insert tIME");
            builder.write_chunk(&chunk)?;
            summary.time_added = true;
        }
        Ok(())
    }
}

// In memory variant, sized for the worst case of both chunks being added
pub fn rewrite_bytes(
    data: &[u8],
    options: &RewriteOptions,
    time: &PrimitiveDateTime,
) -> Result<Vec<u8>, RewriteError> {
    let rewriter = Rewriter::new(options)?;

    let mut cap = data.len();
    if rewriter.text_format.is_some() {
        cap += 256;
    }
    if rewriter.add_time_chunk {
        cap += 19;
    }

    let mut out = Vec::with_capacity(cap);
    rewriter.rewrite(data, &mut out, time)?;
    Ok(out)
}
