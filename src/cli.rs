use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::filename::DEFAULT_PATTERN;
use crate::png::rewrite::RewriteOptions;

#[derive(Parser, Debug)]
#[command(name = "pngstamp")]
#[command(about = "Add Creation Time tEXt and tIME chunks to VRChat screenshots")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Directory holding the screenshots
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the format of the Creation Time text
    #[arg(short, long, value_name = "FMT")]
    pub format: Option<String>,

    /// Don't add the Creation Time tEXt chunk
    #[arg(long)]
    pub no_text: bool,

    /// Don't add the tIME chunk
    #[arg(long)]
    pub no_time: bool,
}

impl Cli {
    // Command line flags win over the config file
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(fmt) = &self.format {
            config.options.creation_time_format = Some(fmt.clone());
        }
        if self.no_text {
            config.options.creation_time_format = None;
        }
        if self.no_time {
            config.options.add_time_chunk = false;
        }
        config
    }
}

pub const DEFAULT_CONFIG: &str = r#"
pattern = '^VRChat_\d+x\d+_(\d+)-(\d+)-(\d+)_(\d+)-(\d+)-(\d+)\.(\d+)\.png$'

[options]
creation_time_format = "[year]:[month]:[day] [hour]:[minute]:[second].[subsecond digits:3]"
add_time_chunk = true
"#;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Filename regex, 7 capture groups: year, month, day, hour, minute, second, millisecond
    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default)]
    pub options: RewriteOptions,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            None => Ok(toml::from_str(DEFAULT_CONFIG)?),
            Some(path) => Ok(toml::from_str(&fs::read_to_string(path)?)?),
        }
    }
}
