//! Data models for resource ingestion
//!
//! This module contains the normalized [`ResourceRecord`] produced for every
//! valid CSV row, the raw [`Row`] it is built from, and the grade types used by
//! the grade-range column.

pub mod enums;

use crate::constants::columns;
use enums::{BoardingType, Cost, Gender, InstructionType, Interest, LocationLimit, State};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Row Provenance
// =============================================================================

/// Where a row came from: file path and 1-based data row number
///
/// The header line is not counted, so the first data line is row 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowLocation {
    pub file: String,
    pub row: usize,
}

impl RowLocation {
    pub fn new(file: impl Into<String>, row: usize) -> Self {
        Self {
            file: file.into(),
            row,
        }
    }
}

impl fmt::Display for RowLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (row {})", self.file, self.row)
    }
}

// =============================================================================
// Raw Row
// =============================================================================

/// One CSV data line as a mapping from column name to raw value
///
/// Columns missing from a short line are absent from the mapping rather than
/// present with an empty value.
#[derive(Debug, Clone)]
pub struct Row {
    location: RowLocation,
    values: HashMap<String, String>,
}

impl Row {
    /// Build a row from a header and a record of the same file
    pub fn from_record(
        location: RowLocation,
        headers: &csv::StringRecord,
        record: &csv::StringRecord,
    ) -> Self {
        let values = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Self { location, values }
    }

    /// Build a row from explicit column/value pairs
    pub fn from_pairs<K, V>(location: RowLocation, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self { location, values }
    }

    pub fn location(&self) -> &RowLocation {
        &self.location
    }

    /// Raw value of a column, untouched
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Whether the column key exists in this row (even if its value is empty)
    pub fn has_column(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Grades
// =============================================================================

/// A single school grade
///
/// Ordering follows school progression: pre-kindergarten, kindergarten, then
/// grades 1 through 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    PreKindergarten,
    Kindergarten,
    Numbered(u8),
}

impl Grade {
    /// Highest numbered grade
    pub const MAX_NUMBERED: u8 = 12;

    /// Parse one grade token ("PK", "K", "1".."12"), ignoring case and whitespace
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("PK") {
            return Some(Grade::PreKindergarten);
        }
        if token.eq_ignore_ascii_case("K") {
            return Some(Grade::Kindergarten);
        }
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match token.parse::<u8>() {
            Ok(n) if (1..=Self::MAX_NUMBERED).contains(&n) => Some(Grade::Numbered(n)),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::PreKindergarten => f.write_str("PK"),
            Grade::Kindergarten => f.write_str("K"),
            Grade::Numbered(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive span of grades with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeRange {
    pub start: Grade,
    pub end: Grade,
}

// =============================================================================
// Normalized Record
// =============================================================================

/// Normalized community resource, ready for upload
///
/// Built once per valid row by the row normalizer and never mutated afterwards.
/// `category` and `sub_category` are always non-empty; optional attributes are
/// `None` when the source row left them blank and are omitted from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Always 0 at parse time; the API assigns the real id
    pub id: u64,

    pub business_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_site: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub category: Vec<String>,

    pub sub_category: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_grade: Option<Grade>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_grade: Option<Grade>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_interest: Option<Vec<Interest>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<Vec<InstructionType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub boarding: Option<Vec<BoardingType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_limit: Option<Vec<LocationLimit>>,
}

impl ResourceRecord {
    /// Serialized attribute names, in declaration order
    ///
    /// Header validation checks column names against this list. Keep it in
    /// step with the struct fields above.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        columns::ID,
        columns::BUSINESS_NAME,
        columns::STREET_ADDRESS,
        columns::STATE,
        columns::CITY,
        columns::ZIP_CODE,
        columns::PHONE,
        columns::WEB_SITE,
        columns::DESCRIPTION,
        columns::CATEGORY,
        columns::SUB_CATEGORY,
        columns::START_GRADE,
        columns::END_GRADE,
        columns::CAREER_INTEREST,
        columns::COST,
        columns::INSTRUCTION,
        columns::BOARDING,
        columns::GENDER,
        columns::LOCATION_LIMIT,
    ];

    /// Create a record holding only the required attributes
    pub fn new(business_name: String, category: Vec<String>, sub_category: Vec<String>) -> Self {
        Self {
            id: 0,
            business_name,
            street_address: None,
            state: None,
            city: None,
            zip_code: None,
            phone: None,
            web_site: None,
            description: None,
            category,
            sub_category,
            start_grade: None,
            end_grade: None,
            career_interest: None,
            cost: None,
            instruction: None,
            boarding: None,
            gender: None,
            location_limit: None,
        }
    }

    /// Whether `name` is one of the record's attribute names
    pub fn is_field_name(name: &str) -> bool {
        Self::FIELD_NAMES.contains(&name)
    }

    /// Store a simple free-text attribute by its column name
    ///
    /// Returns `false` when `column` is not one of the simple scalar columns.
    pub(crate) fn set_scalar(&mut self, column: &str, value: String) -> bool {
        let slot = match column {
            columns::STREET_ADDRESS => &mut self.street_address,
            columns::CITY => &mut self.city,
            columns::ZIP_CODE => &mut self.zip_code,
            columns::PHONE => &mut self.phone,
            columns::WEB_SITE => &mut self.web_site,
            columns::DESCRIPTION => &mut self.description,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    pub fn grade_range(&self) -> Option<GradeRange> {
        match (self.start_grade, self.end_grade) {
            (Some(start), Some(end)) => Some(GradeRange { start, end }),
            _ => None,
        }
    }

    pub(crate) fn set_grade_range(&mut self, range: GradeRange) {
        self.start_grade = Some(range.start);
        self.end_grade = Some(range.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record() -> ResourceRecord {
        let mut record = ResourceRecord::new(
            "Acme Tutoring".to_string(),
            vec!["Tutoring".to_string()],
            vec!["Math".to_string()],
        );
        record.set_scalar(columns::PHONE, "555-1212".to_string());
        record.state = Some(State::California);
        record.instruction = Some(vec![InstructionType::Online, InstructionType::InPerson]);
        record.set_grade_range(GradeRange {
            start: Grade::Kindergarten,
            end: Grade::Numbered(5),
        });
        record
    }

    #[test]
    fn test_new_record_has_only_required_fields() {
        let record = ResourceRecord::new("A".to_string(), vec!["C".into()], vec!["S".into()]);
        assert_eq!(record.id, 0);
        assert!(record.phone.is_none());
        assert!(record.grade_range().is_none());

        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&"businessName"));
        assert!(keys.contains(&"subCategory"));
    }

    #[test]
    fn test_field_registry_matches_serialized_names() {
        let mut record = create_test_record();
        record.street_address = Some("1 Main St".into());
        record.city = Some("Springfield".into());
        record.zip_code = Some("12345".into());
        record.web_site = Some("https://example.org".into());
        record.description = Some("desc".into());
        record.career_interest = Some(vec![Interest::Arts]);
        record.cost = Some(Cost::Free);
        record.boarding = Some(vec![BoardingType::Day]);
        record.gender = Some(Gender::Coed);
        record.location_limit = Some(vec![LocationLimit::County]);

        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), ResourceRecord::FIELD_NAMES.len());
        for key in object.keys() {
            assert!(ResourceRecord::is_field_name(key), "unregistered field {key}");
        }
    }

    #[test]
    fn test_serialized_values_use_canonical_forms() {
        let json = serde_json::to_value(create_test_record()).unwrap();
        assert_eq!(json["state"], "CA");
        assert_eq!(json["instruction"], serde_json::json!(["Online", "In-Person"]));
        assert_eq!(json["startGrade"], "K");
        assert_eq!(json["endGrade"], "5");
        assert_eq!(json["phone"], "555-1212");
    }

    #[test]
    fn test_set_scalar_rejects_other_columns() {
        let mut record = create_test_record();
        assert!(!record.set_scalar(columns::STATE, "CA".to_string()));
        assert!(record.set_scalar(columns::CITY, "Springfield".to_string()));
        assert_eq!(record.city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_grade_parsing_and_ordering() {
        assert_eq!(Grade::parse("pk"), Some(Grade::PreKindergarten));
        assert_eq!(Grade::parse(" K "), Some(Grade::Kindergarten));
        assert_eq!(Grade::parse("12"), Some(Grade::Numbered(12)));
        assert_eq!(Grade::parse("0"), None);
        assert_eq!(Grade::parse("13"), None);
        assert_eq!(Grade::parse("+3"), None);
        assert_eq!(Grade::parse(""), None);

        assert!(Grade::PreKindergarten < Grade::Kindergarten);
        assert!(Grade::Kindergarten < Grade::Numbered(1));
        assert!(Grade::Numbered(9) < Grade::Numbered(10));
    }

    #[test]
    fn test_row_distinguishes_absent_and_empty() {
        let row = Row::from_pairs(RowLocation::new("a.csv", 1), [("phone", "")]);
        assert!(row.has_column("phone"));
        assert_eq!(row.get("phone"), Some(""));
        assert!(!row.has_column("city"));
        assert_eq!(row.location().to_string(), "a.csv (row 1)");
    }

    #[test]
    fn test_row_from_short_record() {
        let headers = csv::StringRecord::from(vec!["businessName", "category", "phone"]);
        let record = csv::StringRecord::from(vec!["Acme", "Tutoring"]);
        let row = Row::from_record(RowLocation::new("a.csv", 3), &headers, &record);
        assert_eq!(row.len(), 2);
        assert!(!row.has_column("phone"));
    }
}
