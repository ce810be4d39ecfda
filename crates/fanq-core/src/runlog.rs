//! Per-run log: append-only entries, mirrored to the configured target.
//!
//! This is the log the scheduler hands back to the caller when the run ends,
//! separate from the tracing pipeline. Entries go to stdout, the error
//! channel, or nowhere while the run is in flight, but are always retained.

use crate::config::LogTarget;

/// Ordered log entries for one queue run.
#[derive(Debug)]
pub struct RunLog {
    target: LogTarget,
    entries: Vec<String>,
}

impl RunLog {
    pub fn new(target: LogTarget) -> Self {
        Self {
            target,
            entries: Vec::new(),
        }
    }

    /// Append an entry, mirroring it to the configured target.
    pub fn append(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        match self.target {
            LogTarget::Stream => println!("{entry}"),
            LogTarget::ErrorChannel => tracing::error!("{entry}"),
            LogTarget::Silent => {}
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The accumulated log as one newline-terminated text blob.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(entry);
            text.push('\n');
        }
        text
    }
}
