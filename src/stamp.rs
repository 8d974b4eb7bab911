use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use filetime::FileTime;
use log::{debug, info};
use regex::Regex;
use tempfile::NamedTempFile;
use thiserror::Error;
use time::{PrimitiveDateTime, UtcOffset};

use crate::cli::Config;
use crate::filename::{compile_pattern, parse_timestamp, FilenameError};
use crate::png::rewrite::{RewriteError, RewriteSummary, Rewriter};

#[derive(Error, Debug)]
pub enum StampError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Filename(#[from] FilenameError),
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
}

pub fn file_time(time: &PrimitiveDateTime, offset: UtcOffset) -> FileTime {
    let time = time.assume_offset(offset);
    FileTime::from_unix_time(time.unix_timestamp(), time.nanosecond())
}

// Rewrites one file into a temp file next to it then swaps it into place,
// the source is never touched unless the whole pass succeeded
pub fn rewrite_file(
    path: &Path,
    rewriter: &Rewriter,
    time: &PrimitiveDateTime,
    mtime: FileTime,
) -> Result<RewriteSummary, StampError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let src = BufReader::new(File::open(path)?);
    let mut tmp = tempfile::Builder::new()
        .prefix(".pngstamp")
        .suffix(".tmp.png")
        .tempfile_in(dir)?;

    let summary = {
        let mut dst = BufWriter::new(tmp.as_file_mut());
        rewriter.rewrite(src, &mut dst, time)?
    };

    fs::set_permissions(tmp.path(), fs::metadata(path)?.permissions())?;
    filetime::set_file_mtime(tmp.path(), mtime)?;

    persist(tmp, path)?;
    Ok(summary)
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<(), StampError> {
    debug!("persist {} -> {}", tmp.path().display(), path.display());
    tmp.persist(path)?;
    Ok(())
}

pub struct Stamper {
    rewriter: Rewriter,
    pattern: Regex,
    offset: UtcOffset,
}

impl Stamper {
    // `offset` is the zone the filename timestamps are in, used for the mtime
    pub fn new(config: &Config, offset: UtcOffset) -> Result<Self, StampError> {
        Ok(Stamper {
            rewriter: Rewriter::new(&config.options)?,
            pattern: compile_pattern(&config.pattern)?,
            offset,
        })
    }

    // Ok(None) when the file name carries no timestamp and was skipped
    pub fn stamp_file(&self, path: &Path) -> Result<Option<RewriteSummary>, StampError> {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return Ok(None),
        };

        let time = match parse_timestamp(name, &self.pattern)? {
            Some(time) => time,
            None => {
                debug!("skip {}", path.display());
                return Ok(None);
            }
        };

        info!("Modify {} ...", path.display());
        let summary = rewrite_file(path, &self.rewriter, &time, file_time(&time, self.offset))?;
        info!(
            "Modify {} done, tEXt: {}, tIME: {}",
            path.display(),
            summary.text_added,
            summary.time_added
        );

        Ok(Some(summary))
    }
}

#[cfg(test)]
mod test_stamp {
    use super::*;
    use crate::png::builder::ChunkBuilder;
    use crate::png::raw::ChunkReaderRaw;
    use crate::png::rewrite::RewriteOptions;
    use crate::png::raw::ChunkError;
    use std::io::Write;

    const NAME: &str = "VRChat_1920x1080_2024-01-02_03-04-05.006.png";

    fn config() -> Config {
        toml::from_str(crate::cli::DEFAULT_CONFIG).unwrap()
    }

    fn simple_png() -> Vec<u8> {
        let mut builder = ChunkBuilder::new(Vec::new());
        builder.write_signature().unwrap();
        builder.write(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]).unwrap();
        builder.write(b"IDAT", &[0x78, 0x9C, 0x63, 0x60, 0x00]).unwrap();
        builder.write(b"IEND", &[]).unwrap();
        builder.into_inner()
    }

    fn types(data: &[u8]) -> Vec<[u8; 4]> {
        ChunkReaderRaw::new(&data[8..])
            .map(|c| c.unwrap().typ)
            .collect()
    }

    fn dir_entries(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn stamps_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        fs::write(&path, simple_png()).unwrap();

        let stamper = Stamper::new(&config(), UtcOffset::UTC).unwrap();
        let summary = stamper.stamp_file(&path).unwrap().unwrap();

        assert!(summary.text_added);
        assert!(summary.time_added);
        assert_eq!(
            types(&fs::read(&path).unwrap()),
            vec![*b"IHDR", *b"IDAT", *b"tEXt", *b"tIME", *b"IEND"]
        );
        assert_eq!(dir_entries(dir.path()), 1);

        let mtime = FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
        assert_eq!(mtime.unix_seconds(), 1_704_164_645);
    }

    #[test]
    fn second_pass_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        fs::write(&path, simple_png()).unwrap();

        let stamper = Stamper::new(&config(), UtcOffset::UTC).unwrap();
        stamper.stamp_file(&path).unwrap();
        let first = fs::read(&path).unwrap();

        let summary = stamper.stamp_file(&path).unwrap().unwrap();
        assert!(!summary.text_added);
        assert!(!summary.time_added);
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn skips_other_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holiday.png");
        fs::write(&path, simple_png()).unwrap();

        let stamper = Stamper::new(&config(), UtcOffset::UTC).unwrap();

        assert!(stamper.stamp_file(&path).unwrap().is_none());
        assert_eq!(fs::read(&path).unwrap(), simple_png());
    }

    #[test]
    fn failure_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        let mut truncated = simple_png();
        truncated.truncate(truncated.len() - 3);
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(&truncated).unwrap();
        }

        let stamper = Stamper::new(&config(), UtcOffset::UTC).unwrap();

        assert!(matches!(
            stamper.stamp_file(&path),
            Err(StampError::Rewrite(RewriteError::Chunk(ChunkError::Truncated)))
        ));
        assert_eq!(fs::read(&path).unwrap(), truncated);
        assert_eq!(dir_entries(dir.path()), 1);
    }

    #[test]
    fn not_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        fs::write(&path, b"GIF89a").unwrap();

        let stamper = Stamper::new(&config(), UtcOffset::UTC).unwrap();

        assert!(matches!(
            stamper.stamp_file(&path),
            Err(StampError::Rewrite(RewriteError::Chunk(
                ChunkError::InvalidSignature(_)
            )))
        ));
        assert_eq!(fs::read(&path).unwrap(), b"GIF89a");
        assert_eq!(dir_entries(dir.path()), 1);
    }

    #[test]
    fn disabled_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        fs::write(&path, simple_png()).unwrap();

        let mut config = config();
        config.options = RewriteOptions::default();
        let stamper = Stamper::new(&config, UtcOffset::UTC).unwrap();
        stamper.stamp_file(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), simple_png());
    }

    #[test]
    fn offset_mtime() {
        let time = parse_timestamp(NAME, &compile_pattern(crate::filename::DEFAULT_PATTERN).unwrap())
            .unwrap()
            .unwrap();
        let jst = UtcOffset::from_hms(9, 0, 0).unwrap();

        let ft = file_time(&time, jst);
        assert_eq!(ft.unix_seconds(), 1_704_164_645 - 9 * 3600);
        assert_eq!(ft.nanoseconds(), 6_000_000);
    }
}
