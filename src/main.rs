use std::process::ExitCode;

use clap::Parser;
use ignore::WalkBuilder;
use log::{error, warn};
use time::UtcOffset;

use pngstamp::cli::{Cli, Config};
use pngstamp::stamp::Stamper;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Needs to be resolved while we are still single threaded
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
        warn!("Local offset unavailable ({}), file times will be in UTC", e);
        UtcOffset::UTC
    });

    // Parse the cli
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => cli.apply(config),
        Err(e) => {
            error!("Config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stamper = match Stamper::new(&config, offset) {
        Ok(stamper) => stamper,
        Err(e) => {
            error!("Config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for entry in WalkBuilder::new(&cli.dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("{}", e);
                failed += 1;
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        // A failed file is left as it was, move on to the next one
        if let Err(e) = stamper.stamp_file(entry.path()) {
            error!("Modify {} failed: {}", entry.path().display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
