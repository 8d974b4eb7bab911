//! PNG chunk stream
//!
//! Just enough of the PNG container to stream a file through chunk by chunk
//! and add metadata chunks in front of `IEND`. Pixel data is never decoded,
//! every chunk that is not acted upon is passed through as is.
//!
//! # Top Level
//!
//! A file is the 8 byte signature followed by a sequence of chunks (see:
//! [`raw::ChunkRaw`]). Unlike the rest of this crate everything in the
//! container is stored in Big Endian format.
//!
//! | Type    | Name     | Description |
//! | ------: | -------- | ----------- |
//! | u32     | length   | The length of the data section of a chunk, is allowed to be 0 bytes |
//! | [u8; 4] | type     | The type of the chunk, ASCII such as `IHDR` |
//! | [u8; N] | data     | The content of the chunk, interpret according to the chunk type |
//! | u32     | crc      | CRC-32 of <code>type \|\| data</code> |
//!
//! The crc of chunks read from the source is *not* verified, it is always
//! recomputed when the chunk is written back out.
//!
//! # Chunk Types
//!
//! Only three types are looked at, everything else is opaque.
//!
//! | Chunk Type | Name      | Description |
//! | :--------: | --------- | ----------- |
//! | tEXt       | Text      | Latin-1 keyword/value pair, a `Creation Time` keyword marks the file as done |
//! | tIME       | Time      | Last modification time, any `tIME` marks the file as done |
//! | IEND       | Image End | Last chunk of the file, new chunks are written just before it |
//!
//! ## tEXt
//!
//! | Type    | Name      | Description |
//! | ------: | --------- | ----------- |
//! | [u8; N] | keyword   | 1 to 79 Latin-1 bytes, no NUL |
//! | u8      | separator | Always `0x00` |
//! | [u8; M] | text      | Latin-1 bytes, not NUL terminated |
//!
//! ## tIME
//!
//! | Type | Name   | Description |
//! | ---: | ------ | ----------- |
//! | u16  | year   | Full year, ie 2024 |
//! | u8   | month  | 1-12 |
//! | u8   | day    | 1-31 |
//! | u8   | hour   | 0-23 |
//! | u8   | minute | 0-59 |
//! | u8   | second | 0-60, 60 allows for a leap second |
pub mod builder;
pub mod meta;
pub mod raw;
pub mod reader;
pub mod rewrite;

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub const TEXT: [u8; 4] = *b"tEXt";
pub const TIME: [u8; 4] = *b"tIME";
pub const IEND: [u8; 4] = *b"IEND";

// Predefined tEXt keyword for the time of original image creation
pub const CREATION_TIME_KEY: &str = "Creation Time";

// The container caps chunk length at 2^31 - 1
const MAX_CHUNK_LENGTH: u32 = 0x7FFF_FFFF;
