//! Parse results and run statistics
//!
//! Each file task returns a [`FileOutcome`]; the session merges outcomes after
//! every task has settled and keeps running totals in [`ParseStats`].

use crate::Error;
use crate::app::models::ResourceRecord;
use std::path::PathBuf;
use std::time::Duration;

/// Result of parsing one file
///
/// `records` holds every row normalized before the first failure, so a failed
/// file may still contribute records.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub records: Vec<ResourceRecord>,
    pub error: Option<Error>,
}

impl FileOutcome {
    pub fn completed(path: PathBuf, records: Vec<ResourceRecord>) -> Self {
        Self {
            path,
            records,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, records: Vec<ResourceRecord>, error: Error) -> Self {
        Self {
            path,
            records,
            error: Some(error),
        }
    }

    pub fn rows_parsed(&self) -> usize {
        self.records.len()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Running totals for a parse session
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParseStats {
    /// Files that parsed to the end without error
    pub files_parsed: usize,

    /// Files aborted by a header, row or read error
    pub files_failed: usize,

    /// Rows normalized into records, including rows from failed files
    pub rows_parsed: usize,

    /// Wall time spent in parse calls
    #[serde(skip)]
    pub duration: Duration,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files_seen(&self) -> usize {
        self.files_parsed + self.files_failed
    }

    pub(crate) fn record(&mut self, outcome: &FileOutcome) {
        self.rows_parsed += outcome.rows_parsed();
        if outcome.is_success() {
            self.files_parsed += 1;
        } else {
            self.files_failed += 1;
        }
    }
}
