use std::path::{Path, PathBuf};

use log::LevelFilter;

use crate::logger;
use crate::store::UserId;

pub const DEFAULT_DIRECTORY: &str = "~/.revarchive";
pub const DB_FILE_NAME: &str = "archive.db";
pub const LOG_ENV: &str = "REVARCHIVE_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub directory: PathBuf,
    pub log_level: LevelFilter,
    pub user: UserId,
}

impl Config {
    /// `directory` may start with `~`. An explicit `log_env` level wins over
    /// the verbosity count.
    pub fn new(directory: &str, verbosity: u64, log_env: Option<&str>) -> Config {
        let directory = shellexpand::tilde(directory).into_owned();

        let log_level = log_env
            .and_then(logger::parse_level)
            .unwrap_or_else(|| logger::level_from_verbosity(verbosity));

        Config {
            directory: PathBuf::from(directory),
            log_level,
            user: UserId::DEFAULT,
        }
    }

    pub fn from_matches(matches: &clap::ArgMatches) -> Config {
        let log_env = std::env::var(LOG_ENV).ok();

        Config::new(
            matches.value_of("directory").unwrap_or(DEFAULT_DIRECTORY),
            matches.occurrences_of("verbose"),
            log_env.as_deref(),
        )
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn db_path(&self) -> PathBuf {
        self.directory.join(DB_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_lives_in_directory() {
        let config = Config::new("/tmp/archive", 0, None);

        assert_eq!(config.db_path(), PathBuf::from("/tmp/archive/archive.db"));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.user, UserId::DEFAULT);
    }

    #[test]
    fn log_env_overrides_verbosity() {
        assert_eq!(Config::new("/x", 2, Some("error")).log_level, LevelFilter::Error);
        assert_eq!(Config::new("/x", 2, Some("bogus")).log_level, LevelFilter::Trace);
    }

    #[test]
    fn tilde_is_expanded() {
        let config = Config::new("~/music", 0, None);

        assert!(!config.directory().starts_with("~"));
    }
}
