use std::path::PathBuf;

use eisen::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidQuadrant("7".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);
    assert!(user.is_validation());
    assert_eq!(user.kind(), "user_error");

    let missing = Error::ProjectNotFound("work".to_string());
    assert_eq!(missing.exit_code(), exit_codes::USER_ERROR);
    assert!(!missing.is_validation());

    let op = Error::import(PathBuf::from("tasks.csv"), "row 1: bad");
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_includes_code_and_details() {
    let err = Error::export(PathBuf::from("/tmp/out.md"), "disk full");
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::OPERATION_FAILED);
    assert_eq!(json.kind, "operation_failed");
    assert!(json.message.contains("Export to /tmp/out.md failed: disk full"));
    let details = json.details.expect("details");
    assert_eq!(details["reason"], "disk full");
}
