//! Parse session orchestration
//!
//! A [`ParseSession`] owns one run over a set of CSV files: it loads the
//! category vocabulary, validates each header, normalizes each row, and
//! collects records and a human-readable error log.
//!
//! Files are parsed concurrently, one task per file. Tasks share nothing
//! mutable; each returns a [`FileOutcome`] and the session merges them in file
//! order once every task has settled. A failing file never cancels its
//! siblings.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::header::validate_column_names;
use super::record_parser::normalize_row;
use super::stats::{FileOutcome, ParseStats};
use crate::app::models::{ResourceRecord, Row, RowLocation};
use crate::app::services::vocabulary::{VocabularySnapshot, VocabularySource};
use crate::{Error, Result};

/// Lifecycle of a parse session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    VocabularyLoaded,
    Parsing,
    Done,
    Failed,
}

/// Read-only inputs shared by every file task
#[derive(Debug, Clone)]
struct ParseContext {
    vocabulary: Arc<VocabularySnapshot>,
    allowed_extra: Arc<BTreeSet<String>>,
}

/// End-to-end parse of a set of resource CSV files
#[derive(Debug)]
pub struct ParseSession {
    state: SessionState,
    context: ParseContext,
    files: BTreeSet<PathBuf>,
    resources: Vec<ResourceRecord>,
    err_log: Vec<String>,
    stats: ParseStats,
}

impl ParseSession {
    /// Create a session that still needs its vocabulary
    pub fn new(allowed_extra: BTreeSet<String>) -> Self {
        Self {
            state: SessionState::Uninitialized,
            context: ParseContext {
                vocabulary: Arc::new(VocabularySnapshot::default()),
                allowed_extra: Arc::new(allowed_extra),
            },
            files: BTreeSet::new(),
            resources: Vec::new(),
            err_log: Vec::new(),
            stats: ParseStats::new(),
        }
    }

    /// Create a session with an already fetched vocabulary
    pub fn with_vocabulary(vocabulary: VocabularySnapshot, allowed_extra: BTreeSet<String>) -> Self {
        let mut session = Self::new(allowed_extra);
        session.install_vocabulary(vocabulary);
        session
    }

    /// Fetch the vocabulary once; must happen before any parsing
    pub async fn load_vocabulary<S: VocabularySource>(&mut self, source: &S) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Err(Error::configuration(
                "Vocabulary can only be loaded once per parse session",
            ));
        }

        match source.fetch_all_categories().await {
            Ok(vocabulary) => {
                self.install_vocabulary(vocabulary);
                Ok(())
            }
            Err(e) => {
                self.fail_with(&e);
                Err(e)
            }
        }
    }

    fn install_vocabulary(&mut self, vocabulary: VocabularySnapshot) {
        info!(
            "Vocabulary loaded: {} categories, {} subcategories",
            vocabulary.category_count(),
            vocabulary.subcategory_count()
        );
        self.context.vocabulary = Arc::new(vocabulary);
        self.state = SessionState::VocabularyLoaded;
    }

    /// Add files to the session; duplicates are ignored
    pub fn add_files<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.files.extend(files);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn files(&self) -> &BTreeSet<PathBuf> {
        &self.files
    }

    pub fn resources(&self) -> &[ResourceRecord] {
        &self.resources
    }

    pub fn err_log(&self) -> &[String] {
        &self.err_log
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Check a header, logging every invalid column before failing
    pub fn validate_column_names<'a, I>(&mut self, file: &str, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let result = validate_column_names(file, headers, &self.context.allowed_extra);
        if let Err(e) = &result {
            self.err_log.extend(e.messages());
        }
        result
    }

    /// Parse one file and return the number of rows it produced
    pub async fn parse_file(&mut self, path: &Path) -> Result<usize> {
        self.begin_parsing()?;
        self.files.insert(path.to_path_buf());

        let start = Instant::now();
        let outcome = parse_csv_file(path.to_path_buf(), self.context.clone()).await;
        let result = self.absorb(outcome);
        self.stats.duration += start.elapsed();

        self.state = if result.is_ok() {
            SessionState::Done
        } else {
            SessionState::Failed
        };
        result
    }

    /// Parse every file concurrently and return the total row count
    ///
    /// All tasks run to completion. Failures are appended to the error log in
    /// file order and the first one (in file order) is returned.
    pub async fn parse_all(&mut self) -> Result<usize> {
        self.begin_parsing()?;
        let start = Instant::now();

        info!("Parsing {} files concurrently", self.files.len());

        let tasks = self.files.iter().map(|path| {
            let context = self.context.clone();
            let path = path.clone();
            let handle = tokio::spawn(parse_csv_file(path.clone(), context));
            async move {
                handle.await.unwrap_or_else(|e| {
                    let reason = format!("Task parsing {} did not finish: {e}", path.display());
                    FileOutcome::failed(path, Vec::new(), Error::processing_interrupted(reason))
                })
            }
        });
        let outcomes = join_all(tasks).await;

        let mut total = 0;
        let mut first_error = None;
        for outcome in outcomes {
            match self.absorb(outcome) {
                Ok(count) => total += count,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        self.stats.duration += start.elapsed();

        match first_error {
            Some(e) => {
                self.state = SessionState::Failed;
                error!(
                    "{} of {} files failed to parse",
                    self.stats.files_failed,
                    self.stats.files_seen()
                );
                Err(e)
            }
            None => {
                self.state = SessionState::Done;
                info!(
                    "Successfully parsed {} rows from {} files",
                    total,
                    self.files.len()
                );
                Ok(total)
            }
        }
    }

    fn begin_parsing(&mut self) -> Result<()> {
        match self.state {
            SessionState::Uninitialized => Err(Error::configuration(
                "Vocabulary must be loaded before parsing",
            )),
            SessionState::Failed => Err(Error::configuration(
                "Parse session already failed; start a new session",
            )),
            _ => {
                self.state = SessionState::Parsing;
                Ok(())
            }
        }
    }

    /// Merge a finished file into the session
    fn absorb(&mut self, outcome: FileOutcome) -> Result<usize> {
        self.stats.record(&outcome);
        let FileOutcome {
            path,
            records,
            error,
        } = outcome;

        let count = records.len();
        self.resources.extend(records);

        match error {
            None => {
                debug!("{}: {} rows parsed", path.display(), count);
                Ok(count)
            }
            Some(e) => {
                warn!("{}: parsing stopped after {} rows: {}", path.display(), count, e);
                self.err_log.extend(e.messages());
                Err(e)
            }
        }
    }

    fn fail_with(&mut self, e: &Error) {
        self.err_log.extend(e.messages());
        self.state = SessionState::Failed;
    }
}

/// Read and parse one file
async fn parse_csv_file(path: PathBuf, context: ParseContext) -> FileOutcome {
    let file_label = path.display().to_string();
    info!("Parsing resource CSV file: {}", file_label);

    match tokio::fs::read(&path).await {
        Ok(content) => parse_csv_content(path, &content, &context),
        Err(e) => {
            let error = Error::io(format!("Failed to read file {file_label}"), e);
            FileOutcome::failed(path, Vec::new(), error)
        }
    }
}

/// Validate the header and normalize every row of an in-memory CSV
///
/// Rows are processed strictly in order; the first invalid row ends the file.
fn parse_csv_content(path: PathBuf, content: &[u8], context: &ParseContext) -> FileOutcome {
    let file_label = path.display().to_string();
    let mut records = Vec::new();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            let error = Error::csv_parsing(&file_label, "Failed to read CSV header", Some(e));
            return FileOutcome::failed(path, records, error);
        }
    };

    if let Err(e) = validate_column_names(&file_label, headers.iter(), &context.allowed_extra) {
        return FileOutcome::failed(path, records, e);
    }

    for (index, result) in reader.records().enumerate() {
        let location = RowLocation::new(&file_label, index + 1);

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let error =
                    Error::csv_parsing(&file_label, format!("Unreadable row {}", index + 1), Some(e));
                return FileOutcome::failed(path, records, error);
            }
        };

        let row = Row::from_record(location, &headers, &record);
        match normalize_row(&row, &context.vocabulary) {
            Ok(resource) => {
                debug!("Parsed {:?}", resource);
                records.push(resource);
            }
            Err(e) => return FileOutcome::failed(path, records, e),
        }
    }

    FileOutcome::completed(path, records)
}
