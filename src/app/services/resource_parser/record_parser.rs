//! Row normalization
//!
//! Turns one raw [`Row`] into a [`ResourceRecord`]. Required columns are
//! checked first and every missing one is reported together; after that each
//! field is validated in a fixed order and the first failure is returned.
//! No I/O happens here.

use super::category::{CategoryKind, validate_category_field};
use super::field_parsers::{
    validate_enum_field, validate_grade_field, validate_list_enum_field, validate_scalar_field,
};
use crate::app::models::enums::{
    BoardingType, Cost, Gender, InstructionType, Interest, LocationLimit, State,
};
use crate::app::models::{ResourceRecord, Row};
use crate::app::services::vocabulary::VocabularySnapshot;
use crate::constants::columns;
use crate::{Error, Result};

/// List the required columns that are absent or blank in a row
pub fn missing_required_fields(row: &Row) -> Vec<String> {
    columns::REQUIRED
        .iter()
        .filter(|field| validate_scalar_field(field, row).is_none())
        .map(|field| field.to_string())
        .collect()
}

/// Fail with every missing required column, or succeed if none are missing
pub fn validate_required_fields(row: &Row) -> Result<()> {
    let fields = missing_required_fields(row);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingRequiredField {
            location: row.location().clone(),
            fields,
        })
    }
}

/// Convert one row into a normalized record
///
/// Order of checks: required fields, simple scalars, category, subcategory,
/// grade range, state, career interest, cost, instruction, boarding, gender,
/// location limit.
pub fn normalize_row(row: &Row, vocabulary: &VocabularySnapshot) -> Result<ResourceRecord> {
    validate_required_fields(row)?;

    let location = row.location();
    let business_name = required_value(columns::BUSINESS_NAME, row)?.to_string();
    let raw_category = required_value(columns::CATEGORY, row)?;
    let raw_sub_category = required_value(columns::SUB_CATEGORY, row)?;

    let mut scalars = Vec::with_capacity(columns::SIMPLE_SCALARS.len());
    for field in columns::SIMPLE_SCALARS {
        if let Some(value) = validate_scalar_field(field, row) {
            scalars.push((*field, value.to_string()));
        }
    }

    let category =
        validate_category_field(raw_category, CategoryKind::Category, vocabulary, location)?;
    let sub_category = validate_category_field(
        raw_sub_category,
        CategoryKind::Subcategory,
        vocabulary,
        location,
    )?;

    let mut record = ResourceRecord::new(business_name, category, sub_category);
    for (field, value) in scalars {
        record.set_scalar(field, value);
    }

    if let Some(range) = validate_grade_field(row)? {
        record.set_grade_range(range);
    }

    record.state = validate_enum_field::<State>(columns::STATE, row)?;
    record.career_interest = validate_list_enum_field::<Interest>(columns::CAREER_INTEREST, row)?;
    record.cost = validate_enum_field::<Cost>(columns::COST, row)?;
    record.instruction =
        validate_list_enum_field::<InstructionType>(columns::INSTRUCTION, row)?;
    record.boarding = validate_list_enum_field::<BoardingType>(columns::BOARDING, row)?;
    record.gender = validate_enum_field::<Gender>(columns::GENDER, row)?;
    record.location_limit =
        validate_list_enum_field::<LocationLimit>(columns::LOCATION_LIMIT, row)?;

    Ok(record)
}

fn required_value<'a>(field: &str, row: &'a Row) -> Result<&'a str> {
    validate_scalar_field(field, row).ok_or_else(|| Error::MissingRequiredField {
        location: row.location().clone(),
        fields: vec![field.to_string()],
    })
}
