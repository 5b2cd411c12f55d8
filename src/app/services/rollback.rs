//! Reversal of a previous upload
//!
//! Reads a rollback-id file written by the uploader and deletes each listed
//! resource. The file is then rewritten to hold only the ids that could not be
//! deleted, so a failed rollback can simply be retried; when everything was
//! deleted the file is removed.

use crate::app::services::progress::create_progress_bar;
use crate::app::services::uploader::{ResourceApi, write_rollback_ids};
use crate::{Error, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Parse the contents of a rollback-id file
///
/// Ids are separated by any whitespace. A token that is not an id is a
/// configuration error naming the file.
pub fn parse_rollback_ids(path: &Path, content: &str) -> Result<Vec<u64>> {
    content
        .split_whitespace()
        .map(|token| {
            token.parse::<u64>().map_err(|_| {
                Error::configuration(format!(
                    "Rollback file {} contains invalid id \"{}\"",
                    path.display(),
                    token
                ))
            })
        })
        .collect()
}

/// Deletes the resources listed in a rollback-id file
#[derive(Debug)]
pub struct RollbackHandler<A> {
    api: A,
    show_progress: bool,
}

impl<A: ResourceApi> RollbackHandler<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Delete every id in `path` and return how many were removed
    pub async fn rollback(&self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::io(
                format!("Failed to read rollback file {}", path.display()),
                e,
            )
        })?;
        let ids = parse_rollback_ids(path, &content)?;
        info!("Rolling back {} resources from {}", ids.len(), path.display());

        let pb = create_progress_bar(ids.len(), "Rolling back resources", self.show_progress);
        let mut remaining = Vec::new();
        let mut failures = Vec::new();

        for id in &ids {
            match self.api.delete_resource(*id).await {
                Ok(true) => debug!("Deleted resource {}", id),
                Ok(false) => {
                    remaining.push(*id);
                    failures.push(format!("Resource {id} could not be deleted"));
                }
                Err(e) => {
                    remaining.push(*id);
                    failures.push(format!("Resource {id} could not be deleted: {e}"));
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.settle_file(path, &remaining).await?;

        if !failures.is_empty() {
            warn!(
                "{} of {} resources could not be rolled back; ids kept in {}",
                failures.len(),
                ids.len(),
                path.display()
            );
            return Err(Error::Rollback { messages: failures });
        }

        Ok(ids.len())
    }

    /// Keep only the ids still to delete, or remove the file when none are left
    async fn settle_file(&self, path: &Path, remaining: &[u64]) -> Result<()> {
        if remaining.is_empty() {
            tokio::fs::remove_file(path).await.map_err(|e| {
                Error::io(
                    format!("Failed to remove rollback file {}", path.display()),
                    e,
                )
            })?;
            info!("Rollback complete; removed {}", path.display());
            Ok(())
        } else {
            write_rollback_ids(path, remaining).await
        }
    }
}
