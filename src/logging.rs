// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Diagnostic logging.

Diagnostics go to standard error as `LEVEL: timestamp - message` lines, so
that they never mix with the table on standard output. `RUST_LOG` overrides
the level chosen on the command line.

*/

use chrono::Local;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::fmt;
use std::io::Write;


const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";


/// Install the global logger.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .format(|buf, record| {
            let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
            writeln!(buf, "{}", render(record.level(), &stamp, record.args()))
        })
        .parse_default_env();

    // Only fails if a logger is already installed, which is harmless.
    let _r = builder.try_init();
}


fn render(level: Level, stamp: &str, message: &fmt::Arguments) -> String {
    format!("{}: {} - {}", level, stamp, message)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_layout() {
        let line = render(Level::Warn, "2025-01-01 12:00:00", &format_args!("no jobs in {}", "schedd"));
        assert_eq!(line, "WARN: 2025-01-01 12:00:00 - no jobs in schedd");
    }

    #[test]
    fn init_twice() {
        init(false);
        init(true);
    }
}
