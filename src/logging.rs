use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_PATH: &str = "/tmp/thinkchat.log";
const LOG_PATH_ENV: &str = "THINKCHAT_LOG_PATH";
const LOG_FILTER_ENV: &str = "THINKCHAT_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// Install the global subscriber. The TUI owns the terminal, so logs go to a
/// file unless stderr is redirected.
pub fn init() -> Result<LogTarget> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let target = resolve_log_target();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match &target {
        LogTarget::File(path) => {
            let file = open_log_file(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|error| anyhow!("failed to install log subscriber: {error}"))?;
        }
        LogTarget::Stderr => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|error| anyhow!("failed to install log subscriber: {error}"))?;
        }
    }

    Ok(target)
}

pub fn resolve_log_target() -> LogTarget {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(PathBuf::from(DEFAULT_LOG_PATH))
            } else {
                None
            }
        })
        .map(LogTarget::File)
        .unwrap_or(LogTarget::Stderr)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_log_target_uses_env_path() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(LOG_PATH_ENV, " /tmp/thinkchat-test.log ");
        assert_eq!(
            resolve_log_target(),
            LogTarget::File(PathBuf::from("/tmp/thinkchat-test.log"))
        );
        std::env::remove_var(LOG_PATH_ENV);
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("thinkchat.log");

        let mut first = open_log_file(&path).expect("create log file");
        first.write_all(b"one\n").unwrap();
        let mut second = open_log_file(&path).expect("reopen log file");
        second.write_all(b"two\n").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }
}
