//! services/client/src/adapters/terminal.rs
//!
//! Terminal implementations of the user-facing ports: a yes/no prompt in front
//! of destructive mutations and a save sink that writes downloads to disk.

use async_trait::async_trait;
use bytes::Bytes;
use docdesk_core::ports::{ConfirmationGate, PortError, PortResult, SaveSink};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes`
/// declines.
pub struct TerminalConfirmation {
    assume_yes: bool,
}

impl TerminalConfirmation {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmationGate for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let mut stderr = io::stderr();
        if write!(stderr, "{prompt} [y/N] ").and_then(|_| stderr.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Writes downloaded documents into a directory.
pub struct DirectorySaveSink {
    dir: PathBuf,
}

impl DirectorySaveSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Only the final path component of `filename` is used.
    fn target(&self, filename: &str) -> PortResult<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| PortError::Validation(format!("unusable filename '{filename}'")))?;
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl SaveSink for DirectorySaveSink {
    async fn save(&self, filename: &str, contents: Bytes) -> PortResult<()> {
        let target = self.target(filename)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PortError::Storage(format!("failed to create {}: {e}", self.dir.display())))?;
        tokio::fs::write(&target, &contents)
            .await
            .map_err(|e| PortError::Storage(format!("failed to write {}: {e}", target.display())))?;
        info!(path = %target.display(), bytes = contents.len(), "download saved");
        Ok(())
    }
}
