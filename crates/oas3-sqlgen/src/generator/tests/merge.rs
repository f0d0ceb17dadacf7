use serde_json::json;

use super::support::{catalog, schema};
use crate::generator::{
  error::SchemaError,
  merge::{self, merge_all_of},
};

#[test]
fn schema_without_all_of_is_unchanged() {
  let catalog = catalog(json!({}));
  let s = schema(json!({"type": "object", "x-tablename": "employee"}));

  assert_eq!(merge_all_of(&s, &catalog).unwrap(), s);
}

#[test]
fn composition_merges_referenced_parent() {
  let catalog = catalog(json!({
    "Person": {
      "type": "object",
      "x-tablename": "employee",
      "properties": {
        "id": {"type": "integer", "x-primary-key": true},
        "name": {"type": "string"}
      }
    }
  }));
  let employee = schema(json!({
    "allOf": [
      {"$ref": "#/components/schemas/Person"},
      {"properties": {"salary": {"type": "number"}}}
    ]
  }));

  let merged = merge_all_of(&employee, &catalog).unwrap();

  assert_eq!(merged.get("type"), Some(&json!("object")));
  assert_eq!(merged.get("x-tablename"), Some(&json!("employee")));
  let properties = merged["properties"].as_object().unwrap();
  let names: Vec<&String> = properties.keys().collect();
  assert_eq!(names, ["id", "name", "salary"]);
}

#[test]
fn later_children_override_properties() {
  let catalog = catalog(json!({}));
  let s = schema(json!({
    "allOf": [
      {"properties": {"value": {"type": "integer"}}},
      {"properties": {"value": {"type": "string"}}}
    ]
  }));

  let merged = merge_all_of(&s, &catalog).unwrap();

  assert_eq!(merged["properties"]["value"], json!({"type": "string"}));
}

#[test]
fn required_lists_are_unioned() {
  let catalog = catalog(json!({}));
  let s = schema(json!({
    "allOf": [
      {"required": ["id", "name"]},
      {"required": ["name", "division"]}
    ]
  }));

  let merged = merge_all_of(&s, &catalog).unwrap();

  assert_eq!(merged.get("required"), Some(&json!(["id", "name", "division"])));
}

#[test]
fn own_keys_override_children() {
  let catalog = catalog(json!({}));
  let s = schema(json!({
    "allOf": [{"x-tablename": "parent"}],
    "x-tablename": "child"
  }));

  let merged = merge_all_of(&s, &catalog).unwrap();

  assert_eq!(merged.get("x-tablename"), Some(&json!("child")));
}

#[test]
fn nested_all_of_is_flattened() {
  let catalog = catalog(json!({}));
  let s = schema(json!({
    "allOf": [
      {
        "allOf": [
          {"type": "object", "properties": {"id": {"type": "integer"}}},
          {"properties": {"name": {"type": "string"}}}
        ]
      }
    ]
  }));

  let merged = merge_all_of(&s, &catalog).unwrap();

  assert_eq!(merged.get("type"), Some(&json!("object")));
  let properties = merged["properties"].as_object().unwrap();
  assert!(properties.contains_key("id") && properties.contains_key("name"));
}

#[test]
fn all_of_not_a_list_is_malformed() {
  let catalog = catalog(json!({}));
  let s = schema(json!({"allOf": true}));

  let error = merge_all_of(&s, &catalog).unwrap_err();

  assert_eq!(
    error,
    SchemaError::MalformedSchema("The value of allOf must be a list.".to_string())
  );
}

#[test]
fn conflicting_types_are_malformed() {
  let catalog = catalog(json!({}));
  let s = schema(json!({
    "allOf": [
      {"type": "object"},
      {"type": "string"}
    ]
  }));

  let error = merge_all_of(&s, &catalog).unwrap_err();
  assert!(matches!(error, SchemaError::MalformedSchema(_)), "got {error:?}");
}

#[test]
fn prepare_resolves_then_merges() {
  let catalog = catalog(json!({
    "Employee": {
      "allOf": [
        {"type": "object", "x-tablename": "employee"},
        {"properties": {"id": {"type": "integer"}}}
      ]
    }
  }));
  let start = schema(json!({"$ref": "#/components/schemas/Employee"}));

  let (name, merged) = merge::prepare("Start", &start, &catalog).unwrap();

  assert_eq!(name, "Employee");
  assert!(!merged.contains_key("allOf"));
  assert_eq!(merged.get("x-tablename"), Some(&json!("employee")));
}

#[test]
fn constructable_requires_tablename() {
  let catalog = catalog(json!({
    "Person": {"type": "object", "x-tablename": "person"}
  }));

  let with_tablename = schema(json!({"type": "object", "x-tablename": "employee"}));
  let through_all_of = schema(json!({"allOf": [{"$ref": "#/components/schemas/Person"}]}));
  let without = schema(json!({"type": "object"}));

  assert!(merge::is_constructable(&with_tablename, &catalog));
  assert!(merge::is_constructable(&through_all_of, &catalog));
  assert!(!merge::is_constructable(&without, &catalog));
}
