//! Resource upload with rollback-id tracking
//!
//! Records are sent one at a time to the resource API. Failures are collected
//! rather than aborting the run; once every record has been tried, the ids the
//! API assigned to successful uploads are written to a rollback-id file so the
//! run can be reversed later, and only then is an aggregate
//! [`Error::ResourceUpload`] raised for the failures.
//!
//! The HTTP calls sit behind [`ResourceApi`] so the bookkeeping can be tested
//! without a server.

use crate::app::models::ResourceRecord;
use crate::app::services::progress::create_progress_bar;
use crate::constants::{RESOURCE_ENDPOINT, RESOURCE_SAVE_ENDPOINT, ROLLBACK_FILE_EXTENSION};
use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the API answered for one save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stored under the returned id
    Created(u64),
    /// Refused; carries the response body for the error log
    Rejected(String),
}

/// Remote operations on stored resources
pub trait ResourceApi {
    fn save_resource(
        &self,
        record: &ResourceRecord,
    ) -> impl Future<Output = Result<SaveOutcome>> + Send;

    /// Delete a stored resource; `Ok(false)` means the API refused
    fn delete_resource(&self, id: u64) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    data: SavedResource,
}

#[derive(Debug, Deserialize)]
struct SavedResource {
    id: u64,
}

/// Interpret a save response: success needs HTTP 200 and a `data.id`
pub fn interpret_save_response(status: u16, body: &str) -> SaveOutcome {
    if status != StatusCode::OK.as_u16() {
        return SaveOutcome::Rejected(body.to_string());
    }

    match serde_json::from_str::<SaveResponse>(body) {
        Ok(response) => SaveOutcome::Created(response.data.id),
        Err(e) => SaveOutcome::Rejected(format!("unreadable response ({e}): {body}")),
    }
}

/// [`ResourceApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpResourceApi {
    client: Client,
    api_url: String,
}

impl HttpResourceApi {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    fn base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    fn save_url(&self) -> String {
        format!("{}{}", self.base(), RESOURCE_SAVE_ENDPOINT)
    }

    fn resource_url(&self, id: u64) -> String {
        format!("{}{}/{}", self.base(), RESOURCE_ENDPOINT, id)
    }
}

impl ResourceApi for HttpResourceApi {
    async fn save_resource(&self, record: &ResourceRecord) -> Result<SaveOutcome> {
        let url = self.save_url();
        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| Error::http(format!("POST {url} failed"), e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response from {url}"), e))?;

        debug!("POST {} -> {} {}", url, status, body);
        Ok(interpret_save_response(status, &body))
    }

    async fn delete_resource(&self, id: u64) -> Result<bool> {
        let url = self.resource_url(id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::http(format!("DELETE {url} failed"), e))?;

        let status = response.status();
        debug!("DELETE {} -> {}", url, status);
        Ok(status.is_success())
    }
}

// =============================================================================
// Rollback-id files
// =============================================================================

/// Path of the rollback-id file for this process
pub fn rollback_file_path(rollback_dir: &Path) -> PathBuf {
    rollback_dir
        .join(std::process::id().to_string())
        .with_extension(ROLLBACK_FILE_EXTENSION)
}

/// Render ids in the rollback-id file format (space separated)
pub fn format_rollback_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write ids to `path`, creating its directory on demand
pub async fn write_rollback_ids(path: &Path, ids: &[u64]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            Error::io(
                format!("Failed to create rollback directory {}", parent.display()),
                e,
            )
        })?;
    }

    tokio::fs::write(path, format_rollback_ids(ids))
        .await
        .map_err(|e| {
            Error::io(
                format!("Failed to write rollback ids to {}", path.display()),
                e,
            )
        })
}

// =============================================================================
// Uploader
// =============================================================================

/// Uploads parsed records and records what it created
#[derive(Debug)]
pub struct ResourceUploader<A> {
    api: A,
    rollback_file: PathBuf,
    show_progress: bool,
}

impl<A: ResourceApi> ResourceUploader<A> {
    /// Create an uploader whose rollback file lives in `rollback_dir`
    pub fn new(api: A, rollback_dir: impl AsRef<Path>) -> Self {
        Self {
            api,
            rollback_file: rollback_file_path(rollback_dir.as_ref()),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn rollback_file(&self) -> &Path {
        &self.rollback_file
    }

    /// Upload every record and return how many were created
    ///
    /// The rollback-id file is written (when anything succeeded) before the
    /// aggregate error for failed records is returned.
    pub async fn upload_all(&self, records: &[ResourceRecord]) -> Result<usize> {
        info!("Uploading {} resources", records.len());
        let pb = create_progress_bar(records.len(), "Uploading resources", self.show_progress);

        let mut uploaded = Vec::new();
        let mut failures = Vec::new();

        for record in records {
            match self.api.save_resource(record).await {
                Ok(SaveOutcome::Created(id)) => {
                    debug!("Uploaded {} as id {}", record.business_name, id);
                    uploaded.push(id);
                }
                Ok(SaveOutcome::Rejected(body)) => failures.push(format!(
                    "Resource {} failed to upload: {}",
                    record.business_name, body
                )),
                Err(e) => failures.push(format!(
                    "Resource {} failed to upload: {}",
                    record.business_name, e
                )),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if !uploaded.is_empty() {
            write_rollback_ids(&self.rollback_file, &uploaded).await?;
            info!(
                "Rollback ids for {} resources written to {}",
                uploaded.len(),
                self.rollback_file.display()
            );
        }

        if !failures.is_empty() {
            warn!(
                "{} of {} resources failed to upload",
                failures.len(),
                records.len()
            );
            return Err(Error::ResourceUpload { messages: failures });
        }

        Ok(uploaded.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory API that rejects configured business names
    #[derive(Default)]
    struct MockApi {
        reject: HashSet<String>,
        next_id: Mutex<u64>,
    }

    impl MockApi {
        fn rejecting(names: &[&str]) -> Self {
            Self {
                reject: names.iter().map(|n| n.to_string()).collect(),
                next_id: Mutex::new(100),
            }
        }
    }

    impl ResourceApi for MockApi {
        async fn save_resource(&self, record: &ResourceRecord) -> Result<SaveOutcome> {
            if self.reject.contains(&record.business_name) {
                return Ok(SaveOutcome::Rejected("{\"error\":\"rejected\"}".to_string()));
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            Ok(SaveOutcome::Created(*next))
        }

        async fn delete_resource(&self, _id: u64) -> Result<bool> {
            Ok(true)
        }
    }

    fn create_records(names: &[&str]) -> Vec<ResourceRecord> {
        names
            .iter()
            .map(|name| {
                ResourceRecord::new(
                    name.to_string(),
                    vec!["Tutoring".to_string()],
                    vec!["Math".to_string()],
                )
            })
            .collect()
    }

    #[test]
    fn test_interpret_save_response() {
        assert_eq!(
            interpret_save_response(200, r#"{"data": {"id": 42}}"#),
            SaveOutcome::Created(42)
        );
        assert_eq!(
            interpret_save_response(500, "boom"),
            SaveOutcome::Rejected("boom".to_string())
        );
        assert!(matches!(
            interpret_save_response(201, r#"{"data": {"id": 42}}"#),
            SaveOutcome::Rejected(_)
        ));
        assert!(matches!(
            interpret_save_response(200, r#"{"data": {}}"#),
            SaveOutcome::Rejected(_)
        ));
    }

    #[test]
    fn test_urls() {
        let api = HttpResourceApi::new("http://localhost:8080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.save_url(), "http://localhost:8080/api/resource/save");
        assert_eq!(api.resource_url(7), "http://localhost:8080/api/resource/7");
    }

    #[test]
    fn test_rollback_file_named_after_pid() {
        let path = rollback_file_path(Path::new("rollback_ids"));
        assert_eq!(
            path,
            PathBuf::from(format!("rollback_ids/{}.txt", std::process::id()))
        );
        assert_eq!(format_rollback_ids(&[3, 14, 15]), "3 14 15");
    }

    #[tokio::test]
    async fn test_upload_all_success() {
        let dir = TempDir::new().unwrap();
        let uploader = ResourceUploader::new(MockApi::rejecting(&[]), dir.path().join("ids"));

        let count = uploader
            .upload_all(&create_records(&["A", "B"]))
            .await
            .unwrap();
        assert_eq!(count, 2);

        let written = std::fs::read_to_string(uploader.rollback_file()).unwrap();
        assert_eq!(written, "101 102");
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_rollback_ids() {
        let dir = TempDir::new().unwrap();
        let uploader = ResourceUploader::new(MockApi::rejecting(&["B"]), dir.path());

        let err = uploader
            .upload_all(&create_records(&["A", "B", "C"]))
            .await
            .unwrap_err();

        match &err {
            Error::ResourceUpload { messages } => {
                assert_eq!(messages.len(), 1);
                assert!(messages[0].starts_with("Resource B failed to upload"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Failed to upload 1 resources"));

        let written = std::fs::read_to_string(uploader.rollback_file()).unwrap();
        assert_eq!(written, "101 102");
    }

    #[tokio::test]
    async fn test_no_rollback_file_when_nothing_uploaded() {
        let dir = TempDir::new().unwrap();
        let uploader = ResourceUploader::new(MockApi::rejecting(&["A"]), dir.path().join("ids"));

        assert!(uploader.upload_all(&create_records(&["A"])).await.is_err());
        assert!(!uploader.rollback_file().exists());
        assert!(!dir.path().join("ids").exists());
    }

    #[tokio::test]
    async fn test_empty_upload() {
        let dir = TempDir::new().unwrap();
        let uploader = ResourceUploader::new(MockApi::default(), dir.path());
        assert_eq!(uploader.upload_all(&[]).await.unwrap(), 0);
        assert!(!uploader.rollback_file().exists());
    }
}
