//! Minimal stderr logger for the `card` binary.

use std::io::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Crates whose records are shown; dependencies stay silent.
const TARGETS: [&str; 2] = ["card_layout", "card"];

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        let krate = metadata.target().split("::").next().unwrap_or_default();
        metadata.level() <= self.level && TARGETS.contains(&krate)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{:<5}] [{}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Maps `-v`/`-q` counts onto a level, starting from warnings.
pub fn level_from_flags(verbose: u8, quiet: u8) -> LevelFilter {
    match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-2 => LevelFilter::Off,
        -1 => LevelFilter::Error,
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn initialize(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(StderrLogger { level }))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_flags_shift_level() {
        assert_eq!(level_from_flags(0, 0), LevelFilter::Warn);
        assert_eq!(level_from_flags(2, 0), LevelFilter::Debug);
        assert_eq!(level_from_flags(9, 0), LevelFilter::Trace);
        assert_eq!(level_from_flags(0, 1), LevelFilter::Error);
        assert_eq!(level_from_flags(0, 3), LevelFilter::Off);
        assert_eq!(level_from_flags(1, 1), LevelFilter::Warn);
    }
}
