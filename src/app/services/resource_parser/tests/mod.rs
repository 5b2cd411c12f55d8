//! Test utilities for resource parser testing
//!
//! Shared fixtures: a small category vocabulary, row builders and temporary
//! CSV files.

use std::collections::BTreeSet;
use std::io::Write;
use tempfile::NamedTempFile;

use crate::app::models::{Row, RowLocation};
use crate::app::services::vocabulary::VocabularySnapshot;
use crate::constants::GRADE_LEVEL_COLUMN;

mod header_tests;

/// Vocabulary used by every parser test
pub fn create_test_vocabulary() -> VocabularySnapshot {
    VocabularySnapshot::new(
        ["Tutoring", "Mentoring", "Camps"],
        ["Math", "Reading", "Science"],
    )
}

/// Default allowed extra header names
pub fn default_allowed_extra() -> BTreeSet<String> {
    BTreeSet::from([GRADE_LEVEL_COLUMN.to_string()])
}

/// Build a row at `test.csv` row 1 from column/value pairs
pub fn create_row(pairs: &[(&str, &str)]) -> Row {
    Row::from_pairs(RowLocation::new("test.csv", 1), pairs.iter().copied())
}

/// Build a minimal valid row plus extra columns
pub fn create_valid_row(extra: &[(&str, &str)]) -> Row {
    let mut pairs = vec![
        ("businessName", "Acme Tutoring"),
        ("category", "Tutoring"),
        ("subCategory", "Math"),
    ];
    pairs.extend_from_slice(extra);
    create_row(&pairs)
}

/// Three-row file used by the end-to-end tests
pub fn create_test_resource_csv() -> String {
    "businessName,category,subCategory,state,GRADELEVEL,instruction,phone\n\
     Acme Tutoring,Tutoring,Math,CA,K-5,Online+In-Person,555-1212\n\
     Bright Futures,Tutoring+Mentoring,Reading,ny,9-12,Hybrid,\n\
     Summer Lab,Camps,Science,,,,\n"
        .to_string()
}

/// Write CSV content to a temporary file with a `.csv` suffix
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}
