use chrono::prelude::*;
use log::{LevelFilter, Metadata, Record};

const CRATE_TARGET: &str = "revarchive";

pub struct Logger;

impl Logger {
    fn module<'a>(&self, target: &'a str) -> Option<&'a str> {
        if target == CRATE_TARGET {
            return Some("main");
        }

        target
            .strip_prefix(CRATE_TARGET)
            .and_then(|rest| rest.strip_prefix("::"))
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Some(module) = self.module(record.target()) {
            eprintln!(
                "{} {:05} [{}] {}",
                Local::now().format("%F %T"),
                record.level(),
                module,
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

/// Installs the logger. Calling it again only changes the level.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_err() {
        debug!("logger already installed");
    }
    log::set_max_level(level);
}

pub fn level_from_verbosity(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn parse_level(s: &str) -> Option<LevelFilter> {
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_crate_targets_are_printed() {
        let logger = Logger;

        assert_eq!(logger.module("revarchive"), Some("main"));
        assert_eq!(logger.module("revarchive::catalog"), Some("catalog"));
        assert_eq!(logger.module("revarchiver::x"), None);
        assert_eq!(logger.module("rusqlite"), None);
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_from_verbosity(0), LevelFilter::Info);
        assert_eq!(level_from_verbosity(1), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(5), LevelFilter::Trace);
        assert_eq!(parse_level("warn"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("loud"), None);
    }
}
