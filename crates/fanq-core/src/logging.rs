//! Tracing setup for the CLI: log file under the XDG state dir, with a
//! stderr fallback when the state dir is unusable.

use anyhow::Result;
use std::fs;
use std::io;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Per-event writer: the cloned log file, or stderr when cloning fails.
enum LogWriter {
    File(fs::File),
    Stderr,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::File(f) => f.write(buf),
            LogWriter::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::File(f) => f.flush(),
            LogWriter::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,fanq=debug"))
}

/// Initialize structured logging to `~/.local/state/fanq/fanq.log`.
/// Returns Err when the log file cannot be opened so the caller can fall
/// back to `init_logging_stderr`.
pub fn init_logging() -> Result<()> {
    let state_home = xdg::BaseDirectories::with_prefix("fanq")?.get_state_home();
    let log_dir = state_home.join("fanq");
    fs::create_dir_all(&log_dir)?;
    let path = log_dir.join("fanq.log");

    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    let writer = BoxMakeWriter::new(move || match file.try_clone() {
        Ok(f) => LogWriter::File(f),
        Err(_) => LogWriter::Stderr,
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("fanq logging initialized at {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only (no file).
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
