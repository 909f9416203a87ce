//! Logger setup. Output goes to stderr, or is appended to the monitor log
//! file when one is configured.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use env_logger::{Env, Target};

/// Formats one log-file line: `[YYYY-mm-dd HH:MM:SS] LEVEL message`
pub fn format_line(ts: DateTime<Local>, level: log::Level, message: &str) -> String {
    format!("[{}] {} {}", ts.format("%Y-%m-%d %H:%M:%S"), level, message)
}

/// Opens `path` for appending, creating it if needed
pub fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initializes the global logger. `RUST_LOG` controls the filter (default `info`).
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::new().default_filter_or("info"));

    if let Some(path) = log_file {
        let file = open_append(path)?;
        builder
            .target(Target::Pipe(Box::new(file)))
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    format_line(Local::now(), record.level(), &record.args().to_string())
                )
            });
    }

    builder.try_init().map_err(io::Error::other)
}
