// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Keep a record of who runs the tool, and when.

Each invocation appends one line of the form `timestamp, username, real name`
to a plain text file. Nothing coordinates concurrent writers; the log is
advisory, so the occasional interleaved line is tolerated.

*/

use chrono::{Local, NaiveDateTime};
use failure::{Error, ResultExt};
use names::NameLookup;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};


/// The name of the log file kept beside the executable.
pub const USAGE_LOG_NAME: &str = "usage_log.txt";

/// ISO 8601, with fractional seconds only when there are any.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";


/// The default log location: next to the running executable.
pub fn default_path() -> Result<PathBuf, Error> {
    let exe = env::current_exe().context("cannot locate the running executable")?;

    match exe.parent() {
        Some(dir) => Ok(dir.join(USAGE_LOG_NAME)),
        None => Err(format_err!("executable path `{}` has no parent directory", exe.display())),
    }
}


/// An append-only usage log.
#[derive(Clone, Debug)]
pub struct UsageLog {
    path: PathBuf,
}

impl UsageLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        UsageLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render a single log line, newline included.
    pub fn entry(when: &NaiveDateTime, username: &str, real_name: &str) -> String {
        format!("{}, {}, {}\n", when.format(TIMESTAMP_FORMAT), username, real_name)
    }

    /// Append a line to the log, creating the file if needed.
    pub fn append(&self, when: &NaiveDateTime, username: &str, real_name: &str) -> Result<(), Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|_| format!("failed to open `{}`", self.path.display()))?;

        file.write_all(UsageLog::entry(when, username, real_name).as_bytes())
            .with_context(|_| format!("failed to write to `{}`", self.path.display()))?;
        Ok(())
    }

    /// Record that `username` is running the tool right now.
    ///
    /// Failing to write the log is not worth stopping for, so problems are
    /// only reported as warnings.
    pub fn log(&self, username: &str, names: &dyn NameLookup) {
        let real_name = names.real_name(username);
        let now = Local::now().naive_local();

        if let Err(e) = self.append(&now, username, &real_name) {
            warn!("could not record usage in `{}`: {}", self.path().display(), e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    struct FixedName;

    impl NameLookup for FixedName {
        fn real_name(&self, _username: &str) -> String {
            "Test User".to_owned()
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn entry_format() {
        assert_eq!(UsageLog::entry(&noon(), "testuser", "Test User"),
                   "2025-01-01T12:00:00, testuser, Test User\n");

        let later = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_micro_opt(12, 0, 0, 250).unwrap();
        assert_eq!(UsageLog::entry(&later, "u", ""), "2025-01-01T12:00:00.000250, u, \n");
    }

    #[test]
    fn appends() {
        let dir = tempdir().unwrap();
        let log = UsageLog::new(dir.path().join(USAGE_LOG_NAME));

        log.append(&noon(), "testuser", "Test User").unwrap();
        log.append(&noon(), "other", "").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "2025-01-01T12:00:00, testuser, Test User\n2025-01-01T12:00:00, other, \n");
    }

    #[test]
    fn log_resolves_name() {
        let dir = tempdir().unwrap();
        let log = UsageLog::new(dir.path().join(USAGE_LOG_NAME));

        log.log("testuser", &FixedName);

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.ends_with(", testuser, Test User\n"));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn unwritable_log_is_not_fatal() {
        let dir = tempdir().unwrap();
        let log = UsageLog::new(dir.path().join("missing").join(USAGE_LOG_NAME));

        assert!(log.append(&noon(), "testuser", "").is_err());
        log.log("testuser", &FixedName);
        assert!(!log.path().exists());
    }

    #[test]
    fn default_is_beside_executable() {
        let path = default_path().unwrap();
        assert_eq!(path.file_name().unwrap(), USAGE_LOG_NAME);
    }
}
