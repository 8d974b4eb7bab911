use regex::Regex;
use thiserror::Error;
use time::{Date, Month, PrimitiveDateTime, Time};

// VRChat_<w>x<h>_<yyyy>-<MM>-<dd>_<HH>-<mm>-<ss>.<fff>.png
pub const DEFAULT_PATTERN: &str =
    r"^VRChat_\d+x\d+_(\d+)-(\d+)-(\d+)_(\d+)-(\d+)-(\d+)\.(\d+)\.png$";

#[derive(Error, Debug)]
pub enum FilenameError {
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error("pattern needs 7 capture groups (year, month, day, hour, minute, second, millisecond), has {0}")]
    Captures(usize),
    #[error("{0:?} does not fit its timestamp field")]
    Field(String),
    #[error(transparent)]
    Range(#[from] time::error::ComponentRange),
}

pub fn compile_pattern(pattern: &str) -> Result<Regex, FilenameError> {
    let regex = Regex::new(pattern)?;

    // captures_len() counts the implicit whole match group
    let groups = regex.captures_len() - 1;
    if groups < 7 {
        return Err(FilenameError::Captures(groups));
    }
    Ok(regex)
}

fn field<T: std::str::FromStr>(text: &str) -> Result<T, FilenameError> {
    text.parse().map_err(|_| FilenameError::Field(text.to_string()))
}

// None when the name does not match, the file is not ours to touch then
pub fn parse_timestamp(
    name: &str,
    pattern: &Regex,
) -> Result<Option<PrimitiveDateTime>, FilenameError> {
    let caps = match pattern.captures(name) {
        Some(caps) => caps,
        None => return Ok(None),
    };

    let mut fields = [""; 7];
    for (i, f) in fields.iter_mut().enumerate() {
        *f = caps
            .get(i + 1)
            .map(|m| m.as_str())
            .ok_or(FilenameError::Captures(i))?;
    }

    let date = Date::from_calendar_date(
        field(fields[0])?,
        Month::try_from(field::<u8>(fields[1])?)?,
        field(fields[2])?,
    )?;
    let time = Time::from_hms_milli(
        field(fields[3])?,
        field(fields[4])?,
        field(fields[5])?,
        field(fields[6])?,
    )?;

    Ok(Some(PrimitiveDateTime::new(date, time)))
}

#[cfg(test)]
mod test_filename {
    use super::*;

    fn pattern() -> Regex {
        compile_pattern(DEFAULT_PATTERN).unwrap()
    }

    #[test]
    fn vrchat_name() {
        let time = parse_timestamp("VRChat_1920x1080_2024-01-02_03-04-05.006.png", &pattern())
            .unwrap()
            .unwrap();

        assert_eq!(time.year(), 2024);
        assert_eq!(time.month(), Month::January);
        assert_eq!(time.day(), 2);
        assert_eq!(time.hour(), 3);
        assert_eq!(time.minute(), 4);
        assert_eq!(time.second(), 5);
        assert_eq!(time.millisecond(), 6);
    }

    #[test]
    fn other_names() {
        for name in [
            "photo.png",
            "VRChat_1920x1080_2024-01-02_03-04-05.006.jpg",
            "VRChat_2024-01-02_03-04-05.006.png",
            "VRChat_1920x1080_2024-01-02_03-04-05.006.tmp.png",
        ] {
            assert!(parse_timestamp(name, &pattern()).unwrap().is_none(), "{}", name);
        }
    }

    #[test]
    fn month_out_of_range() {
        assert!(matches!(
            parse_timestamp("VRChat_1x1_2024-13-02_03-04-05.006.png", &pattern()),
            Err(FilenameError::Range(_))
        ));
    }

    #[test]
    fn day_out_of_range() {
        assert!(matches!(
            parse_timestamp("VRChat_1x1_2023-02-29_03-04-05.006.png", &pattern()),
            Err(FilenameError::Range(_))
        ));
    }

    #[test]
    fn field_overflow() {
        assert!(matches!(
            parse_timestamp("VRChat_1x1_2024-01-02_03-04-05.99999.png", &pattern()),
            Err(FilenameError::Field(_))
        ));
    }

    #[test]
    fn too_few_groups() {
        assert!(matches!(
            compile_pattern(r"^(\d+)-(\d+)\.png$"),
            Err(FilenameError::Captures(2))
        ));
    }

    #[test]
    fn bad_regex() {
        assert!(matches!(
            compile_pattern(r"^VRChat_(\d+"),
            Err(FilenameError::Regex(_))
        ));
    }
}
