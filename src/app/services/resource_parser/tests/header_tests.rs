//! Tests for CSV header validation

use super::*;
use crate::Error;
use crate::app::services::resource_parser::header::{invalid_column_names, validate_column_names};

#[test]
fn test_record_fields_and_extras_accepted() {
    let allowed = default_allowed_extra();
    let headers = ["businessName", "category", "subCategory", "GRADELEVEL", "webSite"];

    assert!(invalid_column_names(headers, &allowed).is_empty());
    assert!(validate_column_names("ok.csv", headers, &allowed).is_ok());
}

#[test]
fn test_every_invalid_name_reported() {
    let allowed = default_allowed_extra();
    let headers = ["businessName", "Category", "nickname", "category", "gradelevel"];

    let invalid = invalid_column_names(headers, &allowed);
    assert_eq!(invalid, vec!["Category", "nickname", "gradelevel"]);

    let err = validate_column_names("bad.csv", headers, &allowed).unwrap_err();
    match &err {
        Error::InvalidColumns { file, fields } => {
            assert_eq!(file, "bad.csv");
            assert_eq!(fields.len(), 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let messages = err.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], "bad.csv: \"nickname\" is not a valid field");
}

#[test]
fn test_extras_are_configurable() {
    let allowed = BTreeSet::from(["notes".to_string()]);

    assert!(invalid_column_names(["businessName", "notes"], &allowed).is_empty());
    assert_eq!(
        invalid_column_names(["GRADELEVEL"], &allowed),
        vec!["GRADELEVEL"]
    );
}

#[test]
fn test_session_logs_invalid_columns() {
    let mut session = crate::app::services::resource_parser::ParseSession::with_vocabulary(
        create_test_vocabulary(),
        default_allowed_extra(),
    );

    assert!(session.validate_column_names("a.csv", ["businessName"]).is_ok());
    assert!(session.err_log().is_empty());

    assert!(session.validate_column_names("b.csv", ["foo", "bar"]).is_err());
    assert_eq!(
        session.err_log(),
        [
            "b.csv: \"foo\" is not a valid field",
            "b.csv: \"bar\" is not a valid field"
        ]
    );
}
