//! Flat-file archive of completed event logs.
//!
//! Each save writes two documents under the archive directory: a timestamped
//! snapshot (kept forever) and a `{claim}_latest.json` overwritten in place,
//! so a dashboard can always reload the most recent run for a claim without
//! scanning the directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::log::LogEvent;

/// Errors from archive reads and writes.
#[derive(Debug, Error, Diagnostic)]
pub enum ArchiveError {
    #[error("archive I/O failure")]
    #[diagnostic(code(claimsim::archive::io))]
    Io(#[from] std::io::Error),

    #[error("archived document is not valid JSON")]
    #[diagnostic(
        code(claimsim::archive::serde),
        help("The archive only reads documents it wrote itself; was the file edited by hand?")
    )]
    Serde(#[from] serde_json::Error),
}

/// One archived run: the log plus enough claim context to label it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedLog {
    pub claim_number: String,
    pub patient_name: String,
    /// Epoch milliseconds at save time.
    pub saved_at: i64,
    pub events: Vec<LogEvent>,
}

/// Flat-file event-log archive rooted at one directory.
#[derive(Debug)]
pub struct EventLogArchive {
    base_dir: PathBuf,
}

impl EventLogArchive {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist a run's events. Returns the path of the timestamped snapshot.
    pub fn save(
        &self,
        claim_number: &str,
        patient_name: &str,
        events: &[LogEvent],
    ) -> Result<PathBuf, ArchiveError> {
        std::fs::create_dir_all(&self.base_dir)?;

        let now = Utc::now();
        let document = ArchivedLog {
            claim_number: claim_number.to_string(),
            patient_name: patient_name.to_string(),
            saved_at: now.timestamp_millis(),
            events: events.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let key = sanitize(claim_number);
        let snapshot = self
            .base_dir
            .join(format!("{key}_{}.json", now.format("%Y%m%d_%H%M%S")));
        std::fs::write(&snapshot, &json)?;
        std::fs::write(self.latest_path(claim_number), &json)?;

        info!(claim_number, events = events.len(), path = %snapshot.display(), "event log archived");
        Ok(snapshot)
    }

    /// The most recently saved log for a claim, if any.
    pub fn load_latest(&self, claim_number: &str) -> Result<Option<ArchivedLog>, ArchiveError> {
        let path = self.latest_path(claim_number);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn latest_path(&self, claim_number: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}_latest.json", sanitize(claim_number)))
    }
}

/// Filename-safe form of a claim number: spaces and path separators become
/// underscores.
fn sanitize(claim_number: &str) -> String {
    claim_number
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize("CLM 2025/10\\47"), "CLM_2025_10_47");
        assert_eq!(sanitize("CLM-2025-1047"), "CLM-2025-1047");
    }
}
