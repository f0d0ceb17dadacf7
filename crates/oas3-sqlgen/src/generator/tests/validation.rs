use serde_json::json;

use super::support::{catalog, schema};
use crate::generator::validation::{check_model, check_models};

#[test]
fn empty_schema_has_no_type() {
  let verdict = check_model(&schema(json!({})), &catalog(json!({})));

  assert!(!verdict.valid);
  assert_eq!(verdict.reason.as_deref(), Some(r#"no "type" key was found, define a type"#));
}

#[test]
fn type_value_not_a_string() {
  let verdict = check_model(&schema(json!({"type": true})), &catalog(json!({})));

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some("the type value is true, change it to a string value")
  );
}

#[test]
fn type_not_object() {
  let verdict = check_model(&schema(json!({"type": "not object"})), &catalog(json!({})));

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some(r#"the type of the schema is "not object", change it to be "object""#)
  );
}

#[test]
fn ref_value_not_a_string() {
  let verdict = check_model(&schema(json!({"$ref": true})), &catalog(json!({})));

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some("malformed schema :: The value of $ref must ba a string. ")
  );
}

#[test]
fn ref_unresolved() {
  let verdict = check_model(
    &schema(json!({"$ref": "#/components/schemas/RefSchema"})),
    &catalog(json!({})),
  );

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some("reference :: 'RefSchema was not found in schemas.' ")
  );
}

#[test]
fn ref_to_non_object_type() {
  let verdict = check_model(
    &schema(json!({"$ref": "#/components/schemas/RefSchema"})),
    &catalog(json!({"RefSchema": {"type": "not object"}})),
  );

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some(r#"the type of the schema is "not object", change it to be "object""#)
  );
}

#[test]
fn all_of_not_a_list() {
  let verdict = check_model(&schema(json!({"allOf": true})), &catalog(json!({})));

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some("malformed schema :: The value of allOf must be a list. ")
  );
}

#[test]
fn all_of_child_not_object_type() {
  let verdict = check_model(&schema(json!({"allOf": [{"type": "not object"}]})), &catalog(json!({})));

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some(r#"the type of the schema is "not object", change it to be "object""#)
  );
}

#[test]
fn missing_tablename() {
  let verdict = check_model(&schema(json!({"type": "object"})), &catalog(json!({})));

  assert!(!verdict.valid);
  assert_eq!(
    verdict.reason.as_deref(),
    Some(r#"no "x-tablename" key was found, define the name of the table"#)
  );
}

#[test]
fn managed_schema_is_valid() {
  let verdict = check_model(
    &schema(json!({"type": "object", "x-tablename": "employee"})),
    &catalog(json!({})),
  );

  assert!(verdict.valid);
  assert_eq!(verdict.reason, None);
}

#[test]
fn check_models_of_empty_catalog_is_empty() {
  assert!(check_models(&catalog(json!({}))).is_empty());
}

#[test]
fn check_models_returns_failures_only() {
  let catalog = catalog(json!({
    "Employee": {"type": "object", "x-tablename": "employee"},
    "Payload": {"type": "object"}
  }));

  let verdicts = check_models(&catalog);

  assert_eq!(verdicts.len(), 1);
  assert!(verdicts.contains_key("Payload"));
  assert!(!verdicts["Payload"].valid);
}
