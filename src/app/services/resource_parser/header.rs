//! CSV header validation against the resource schema
//!
//! A header name is accepted when it is one of the record's attribute names
//! ([`ResourceRecord::FIELD_NAMES`]) or one of the configured extra fields.
//! Matching is exact and case-sensitive.

use crate::app::models::ResourceRecord;
use crate::{Error, Result};
use std::collections::BTreeSet;

/// Collect every header name that is neither a record field nor an allowed extra
pub fn invalid_column_names<'a, I>(headers: I, allowed_extra: &BTreeSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .filter(|name| !ResourceRecord::is_field_name(name) && !allowed_extra.contains(*name))
        .map(str::to_string)
        .collect()
}

/// Check a whole header, reporting every invalid name at once
pub fn validate_column_names<'a, I>(
    file: &str,
    headers: I,
    allowed_extra: &BTreeSet<String>,
) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let fields = invalid_column_names(headers, allowed_extra);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidColumns {
            file: file.to_string(),
            fields,
        })
    }
}
