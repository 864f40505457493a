#![forbid(unsafe_code)]

//! Log output setup.
//!
//! The terminal belongs to the UI, so logs only go to a file. The filter is
//! read from `DECKBOT_LOG` using `EnvFilter` directives and defaults to
//! `info`.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::cli::Opts;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "DECKBOT_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Does nothing without `--log-file`.
pub fn init(opts: &Opts) -> io::Result<()> {
    let Some(path) = &opts.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let installed = if opts.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(io::Error::other)
}
