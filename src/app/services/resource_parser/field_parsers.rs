//! Field validation utilities for resource rows
//!
//! Pure helpers that pull one column out of a [`Row`], coerce it, and check it
//! against a closed vocabulary. A missing or blank column is never an error
//! here; it comes back as `None` and the record attribute stays unset.

use crate::app::models::enums::Vocabulary;
use crate::app::models::{Grade, GradeRange, Row, RowLocation};
use crate::constants::{GRADE_LEVEL_COLUMN, GRADE_RANGE_DELIMITER, MULTI_VALUE_DELIMITER};
use crate::{Error, Result};

/// Get the raw value of a column if it is present and not blank
///
/// The value is returned as written in the file; trimming is only used to
/// decide whether it is blank.
pub fn validate_scalar_field<'a>(field: &str, row: &'a Row) -> Option<&'a str> {
    row.get(field).filter(|value| !value.trim().is_empty())
}

/// Parse a single-valued enum column
pub fn validate_enum_field<E: Vocabulary>(field: &str, row: &Row) -> Result<Option<E>> {
    let Some(raw) = validate_scalar_field(field, row) else {
        return Ok(None);
    };

    E::parse_token(raw)
        .map(Some)
        .map_err(|unknown| invalid_enum_value(row.location(), field, unknown.value, E::NAME))
}

/// Parse a `+`-delimited list-enum column
///
/// Tokens are trimmed and validated in order; the first invalid token is
/// reported. Order and duplicates are preserved.
pub fn validate_list_enum_field<E: Vocabulary>(field: &str, row: &Row) -> Result<Option<Vec<E>>> {
    let Some(raw) = validate_scalar_field(field, row) else {
        return Ok(None);
    };

    raw.split(MULTI_VALUE_DELIMITER)
        .map(|token| {
            E::parse_token(token).map_err(|unknown| {
                invalid_enum_value(row.location(), field, unknown.value, E::NAME)
            })
        })
        .collect::<Result<Vec<E>>>()
        .map(Some)
}

/// Parse the grade-range column of a row, if present
pub fn validate_grade_field(row: &Row) -> Result<Option<GradeRange>> {
    match validate_scalar_field(GRADE_LEVEL_COLUMN, row) {
        Some(raw) => parse_grade_range(raw, row.location()).map(Some),
        None => Ok(None),
    }
}

/// Parse a grade span such as `"K-5"`, `"9-12"` or a single grade `"9"`
///
/// Grammar: `grade [ "-" grade ]`, where a grade is `PK`, `K` or `1`..`12`
/// (letters in any case, whitespace around tokens ignored). A single grade
/// yields a range that starts and ends on it. The start may not come after
/// the end.
pub fn parse_grade_range(raw: &str, location: &RowLocation) -> Result<GradeRange> {
    let invalid = |reason: &str| Error::InvalidGradeFormat {
        location: location.clone(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = raw.split(GRADE_RANGE_DELIMITER).collect();
    let (start, end) = match parts.as_slice() {
        [single] => {
            let grade = Grade::parse(single).ok_or_else(|| invalid("unrecognized grade"))?;
            (grade, grade)
        }
        [start, end] => (
            Grade::parse(start).ok_or_else(|| invalid("unrecognized start grade"))?,
            Grade::parse(end).ok_or_else(|| invalid("unrecognized end grade"))?,
        ),
        _ => return Err(invalid("expected a single grade or a START-END pair")),
    };

    if start > end {
        return Err(invalid("start grade is after end grade"));
    }

    Ok(GradeRange { start, end })
}

fn invalid_enum_value(
    location: &RowLocation,
    field: &str,
    value: String,
    vocabulary: &'static str,
) -> Error {
    Error::InvalidEnumValue {
        location: location.clone(),
        field: field.to_string(),
        value,
        vocabulary,
    }
}
