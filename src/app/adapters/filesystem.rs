//! Input path discovery
//!
//! Command-line paths may name CSV files or directories. Directories are walked
//! recursively; only files with a `.csv` extension are kept and anything else
//! is skipped silently. Paths that do not exist are collected and reported
//! together once every argument has been looked at.

use crate::constants::CSV_EXTENSION;
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Whether a path names a CSV file by extension (case-sensitive)
pub fn is_csv_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == CSV_EXTENSION)
}

/// Resolve CLI paths into an ordered, deduplicated set of CSV files
pub fn discover_csv_files<P: AsRef<Path>>(paths: &[P]) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    let mut missing = Vec::new();

    for path in paths {
        let path = path.as_ref();

        if path.is_dir() {
            collect_directory(path, &mut files);
        } else if is_csv_file(path) {
            files.insert(path.to_path_buf());
        } else if path.exists() {
            debug!("Ignoring non-CSV input {}", path.display());
        } else {
            missing.push(path.display().to_string());
        }
    }

    if !missing.is_empty() {
        return Err(Error::PathNotFound { paths: missing });
    }

    debug!("Discovered {} CSV files", files.len());
    Ok(files)
}

fn collect_directory(dir: &Path, files: &mut BTreeSet<PathBuf>) {
    for entry in WalkDir::new(dir).follow_links(true) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if is_csv_file(path) {
                    files.insert(path.to_path_buf());
                }
            }
            Err(e) => {
                warn!("Error walking directory {}: {}", dir.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), "businessName\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("upper.CSV"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("b.csv"), "businessName\n").unwrap();
        dir
    }

    #[test]
    fn test_directory_is_walked_recursively() {
        let dir = create_tree();
        let files = discover_csv_files(&[dir.path()]).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 2);
        assert!(names.contains(&"a.csv".to_string()));
        assert!(names.contains(&"b.csv".to_string()));
    }

    #[test]
    fn test_duplicates_collapse() {
        let dir = create_tree();
        let file = dir.path().join("a.csv");
        let files = discover_csv_files(&[file.clone(), dir.path().to_path_buf(), file]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_non_csv_file_ignored() {
        let dir = create_tree();
        let files = discover_csv_files(&[dir.path().join("notes.txt")]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_paths_reported_together() {
        let dir = create_tree();
        let err = discover_csv_files(&[
            dir.path().join("gone.csv"),
            dir.path().join("a.csv"),
            dir.path().join("missing_dir"),
        ])
        .unwrap_err();

        match &err {
            Error::PathNotFound { paths } => assert_eq!(paths.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Some paths were not found:"));
        assert!(err.messages()[0].ends_with("gone.csv\" does not exist"));
    }
}
