//! Compound category and subcategory validation
//!
//! Category columns hold one or more names joined with `+`
//! (`"Tutoring+Mentoring"`). Every name must exist in the vocabulary snapshot
//! loaded at session start.

use crate::app::models::RowLocation;
use crate::app::services::vocabulary::VocabularySnapshot;
use crate::constants::MULTI_VALUE_DELIMITER;
use crate::{Error, Result};

/// Which half of the vocabulary a column is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Category,
    Subcategory,
}

impl CategoryKind {
    fn contains(self, vocabulary: &VocabularySnapshot, name: &str) -> bool {
        match self {
            CategoryKind::Category => vocabulary.has_category(name),
            CategoryKind::Subcategory => vocabulary.has_subcategory(name),
        }
    }

    fn unknown(self, location: &RowLocation, value: &str) -> Error {
        let location = location.clone();
        let value = value.to_string();
        match self {
            CategoryKind::Category => Error::UnknownCategory { location, value },
            CategoryKind::Subcategory => Error::UnknownSubcategory { location, value },
        }
    }
}

/// Split a compound token and check every part against the vocabulary
///
/// Parts are trimmed and returned in their original order, duplicates kept.
/// The first unrecognized part is reported.
pub fn validate_category_field(
    raw: &str,
    kind: CategoryKind,
    vocabulary: &VocabularySnapshot,
    location: &RowLocation,
) -> Result<Vec<String>> {
    raw.split(MULTI_VALUE_DELIMITER)
        .map(str::trim)
        .map(|name| {
            if kind.contains(vocabulary, name) {
                Ok(name.to_string())
            } else {
                Err(kind.unknown(location, name))
            }
        })
        .collect()
}
