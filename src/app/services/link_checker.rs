//! Reachability checks for links stored in a CSV column
//!
//! Each data row contributes the URL in one column. URLs are probed
//! concurrently: a HEAD request first, then a GET when HEAD reports an error
//! status (some servers refuse HEAD). A TLS failure is retried once with
//! certificate verification disabled, since many small sites serve broken
//! chains but are otherwise fine. A link is reachable when the final status is
//! below 400.
//!
//! Row numbers count the header as row 1, so the first data row is row 2.

use crate::app::services::progress::create_progress_bar;
use crate::constants::{BROKEN_STATUS_THRESHOLD, LINK_CHECK_TIMEOUT, LINK_CHECK_USER_AGENT};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use reqwest::{Client, Method};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

// =============================================================================
// Link rows
// =============================================================================

/// One data row and the link taken from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    /// Line number in the file, header included
    pub row_number: usize,
    pub fields: Vec<String>,
    /// Trimmed link text
    pub link: String,
}

/// Rows of a link file split into checkable and skipped
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    pub header: Vec<String>,
    pub rows: Vec<LinkRow>,
    /// Row numbers too short to contain the link column
    pub skipped: Vec<usize>,
}

/// Read a CSV file and pull the link out of column `column` (zero-based)
pub fn read_link_table(path: &Path, column: usize) -> Result<LinkTable> {
    let file_label = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv_parsing(&file_label, "Failed to open CSV file", Some(e)))?;

    let header = reader
        .headers()
        .map_err(|e| Error::csv_parsing(&file_label, "Failed to read CSV header", Some(e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = LinkTable {
        header,
        ..Default::default()
    };

    for (index, result) in reader.records().enumerate() {
        let row_number = index + 2;
        let record = result.map_err(|e| {
            Error::csv_parsing(&file_label, format!("Unreadable row {row_number}"), Some(e))
        })?;

        match record.get(column) {
            Some(link) => table.rows.push(LinkRow {
                row_number,
                fields: record.iter().map(str::to_string).collect(),
                link: link.trim().to_string(),
            }),
            None => {
                warn!(
                    "Row {} does not have at least {} columns. Skipping.",
                    row_number,
                    column + 1
                );
                table.skipped.push(row_number);
            }
        }
    }

    Ok(table)
}

// =============================================================================
// Probing
// =============================================================================

/// Result of probing one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Final status below the broken threshold
    Reachable(u16),
    /// Server answered with an error status
    ErrorStatus(u16),
    /// No usable response
    RequestFailed(String),
    /// The link cell was blank
    Empty,
}

impl LinkStatus {
    pub fn from_status(status: u16) -> Self {
        if status < BROKEN_STATUS_THRESHOLD {
            LinkStatus::Reachable(status)
        } else {
            LinkStatus::ErrorStatus(status)
        }
    }

    pub fn is_broken(&self) -> bool {
        !matches!(self, LinkStatus::Reachable(_))
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Reachable(status) => write!(f, "reachable ({status})"),
            LinkStatus::ErrorStatus(status) => write!(f, "HTTP {status}"),
            LinkStatus::RequestFailed(reason) => write!(f, "request failed: {reason}"),
            LinkStatus::Empty => f.write_str("empty link"),
        }
    }
}

/// Something that can decide whether a URL is reachable
pub trait LinkProbe {
    fn probe(&self, url: &str) -> impl Future<Output = LinkStatus> + Send;
}

/// Whether a request error came from the TLS layer
///
/// reqwest does not expose a dedicated kind for this, so the source chain is
/// searched for certificate/TLS wording.
pub fn is_tls_error(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let text = err.to_string().to_ascii_lowercase();
        if ["certificate", "tls", "ssl"].iter().any(|k| text.contains(k)) {
            return true;
        }
        current = err.source();
    }
    false
}

/// Whether a failed request should be retried without certificate checks
///
/// Only the causes are inspected. The top-level reqwest message embeds the
/// request URL, which may itself contain words like "ssl".
pub fn is_tls_request_error(error: &reqwest::Error) -> bool {
    error.source().is_some_and(is_tls_error)
}

/// [`LinkProbe`] over HTTP with a browser-like user agent
#[derive(Debug, Clone)]
pub struct HttpLinkProbe {
    client: Client,
    insecure_client: Client,
}

impl HttpLinkProbe {
    pub fn new() -> Result<Self> {
        Self::with_timeout(LINK_CHECK_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let build = |accept_invalid_certs: bool| {
            Client::builder()
                .user_agent(LINK_CHECK_USER_AGENT)
                .timeout(timeout)
                .danger_accept_invalid_certs(accept_invalid_certs)
                .build()
                .map_err(|e| Error::http("Failed to create HTTP client", e))
        };

        Ok(Self {
            client: build(false)?,
            insecure_client: build(true)?,
        })
    }

    async fn status(
        client: &Client,
        method: Method,
        url: &str,
    ) -> std::result::Result<u16, reqwest::Error> {
        let response = client.request(method, url).send().await?;
        Ok(response.status().as_u16())
    }

    async fn probe_insecure(&self, url: &str, cause: &reqwest::Error) -> LinkStatus {
        warn!("TLS error for URL {}: {}. Retrying without verification.", url, cause);
        match Self::status(&self.insecure_client, Method::GET, url).await {
            Ok(status) => LinkStatus::from_status(status),
            Err(e) => LinkStatus::RequestFailed(e.to_string()),
        }
    }
}

impl LinkProbe for HttpLinkProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        let url = url.trim();
        if url.is_empty() {
            return LinkStatus::Empty;
        }

        let head = match Self::status(&self.client, Method::HEAD, url).await {
            Ok(status) => status,
            Err(e) if is_tls_request_error(&e) => return self.probe_insecure(url, &e).await,
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                return LinkStatus::RequestFailed(e.to_string());
            }
        };

        if head < BROKEN_STATUS_THRESHOLD {
            return LinkStatus::Reachable(head);
        }

        debug!("HEAD {} returned {}; retrying with GET", url, head);
        match Self::status(&self.client, Method::GET, url).await {
            Ok(status) => LinkStatus::from_status(status),
            Err(e) if is_tls_request_error(&e) => self.probe_insecure(url, &e).await,
            Err(e) => LinkStatus::RequestFailed(e.to_string()),
        }
    }
}

// =============================================================================
// Checker
// =============================================================================

/// A row whose link is not reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    pub row: LinkRow,
    pub status: LinkStatus,
}

/// Outcome of checking one file
#[derive(Debug, Clone, Default)]
pub struct LinkCheckReport {
    pub header: Vec<String>,
    pub checked: usize,
    pub skipped: Vec<usize>,
    /// Ordered by row number
    pub broken: Vec<BrokenLink>,
}

impl LinkCheckReport {
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty()
    }
}

/// Checks every link of a CSV column with bounded concurrency
#[derive(Debug)]
pub struct LinkChecker<P> {
    probe: P,
    concurrency: usize,
    show_progress: bool,
}

impl<P: LinkProbe + Sync> LinkChecker<P> {
    pub fn new(probe: P, concurrency: usize) -> Self {
        Self {
            probe,
            concurrency: concurrency.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Read `path` and check the link in `column` (zero-based) of every row
    pub async fn check_file(&self, path: &Path, column: usize) -> Result<LinkCheckReport> {
        let table = read_link_table(path, column)?;
        info!(
            "Checking {} links from {} (column {})",
            table.rows.len(),
            path.display(),
            column + 1
        );
        Ok(self.check_table(table).await)
    }

    /// Probe every row of an already loaded table
    pub async fn check_table(&self, table: LinkTable) -> LinkCheckReport {
        let LinkTable {
            header,
            rows,
            skipped,
        } = table;
        let checked = rows.len();
        let pb = create_progress_bar(checked, "Checking links", self.show_progress);

        let probe = &self.probe;
        let mut broken: Vec<BrokenLink> = stream::iter(rows)
            .map(|row| {
                let pb = pb.clone();
                async move {
                    let status = if row.link.is_empty() {
                        LinkStatus::Empty
                    } else {
                        probe.probe(&row.link).await
                    };
                    pb.inc(1);
                    debug!("Row {}: {} -> {}", row.row_number, row.link, status);
                    BrokenLink { row, status }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter(|result| futures::future::ready(result.status.is_broken()))
            .collect()
            .await;
        pb.finish_and_clear();

        broken.sort_by_key(|b| b.row.row_number);
        info!("{} of {} links are broken", broken.len(), checked);

        LinkCheckReport {
            header,
            checked,
            skipped,
            broken,
        }
    }
}
