use serde_json::{Value, json};

use super::support::catalog;
use crate::generator::{
  catalog::Catalog,
  error::SchemaError,
  inheritance::{Inheritance, classify},
};

fn classify_entry(catalog: &Catalog, name: &str) -> Result<Inheritance, SchemaError> {
  let schema = catalog.get(name).cloned().unwrap();
  classify(name, &schema, catalog)
}

fn parent_schema() -> Value {
  json!({
    "type": "object",
    "x-tablename": "person",
    "properties": {
      "id": {"type": "integer", "x-primary-key": true},
      "name": {"type": "string"}
    }
  })
}

#[test]
fn schema_without_inherits_is_standalone() {
  let catalog = catalog(json!({
    "Employee": {"type": "object", "x-tablename": "employee", "properties": {}}
  }));

  assert_eq!(classify_entry(&catalog, "Employee").unwrap(), Inheritance::None);
}

#[test]
fn inherits_false_is_standalone() {
  let catalog = catalog(json!({
    "Person": parent_schema(),
    "Employee": {
      "x-inherits": false,
      "allOf": [{"$ref": "#/components/schemas/Person"}]
    }
  }));

  assert_eq!(classify_entry(&catalog, "Employee").unwrap(), Inheritance::None);
}

#[test]
fn shared_tablename_is_single_table() {
  let catalog = catalog(json!({
    "Person": parent_schema(),
    "Employee": {
      "x-inherits": true,
      "allOf": [
        {"$ref": "#/components/schemas/Person"},
        {"properties": {"salary": {"type": "number"}}}
      ]
    }
  }));

  assert_eq!(
    classify_entry(&catalog, "Employee").unwrap(),
    Inheritance::SingleTable {
      parent: "Person".to_string()
    }
  );
}

#[test]
fn named_parent_is_matched() {
  let catalog = catalog(json!({
    "Person": parent_schema(),
    "Employee": {
      "x-inherits": "Person",
      "allOf": [{"$ref": "#/components/schemas/Person"}]
    }
  }));

  assert_eq!(
    classify_entry(&catalog, "Employee").unwrap(),
    Inheritance::SingleTable {
      parent: "Person".to_string()
    }
  );
}

#[test]
fn named_parent_not_in_all_of_is_malformed() {
  let catalog = catalog(json!({
    "Person": parent_schema(),
    "Employee": {
      "x-inherits": "Division",
      "allOf": [{"$ref": "#/components/schemas/Person"}]
    }
  }));

  let error = classify_entry(&catalog, "Employee").unwrap_err();
  assert!(matches!(error, SchemaError::MalformedSchema(_)), "got {error:?}");
}

#[test]
fn inherits_without_parent_reference_is_malformed() {
  let catalog = catalog(json!({
    "Employee": {
      "type": "object",
      "x-tablename": "employee",
      "x-inherits": true,
      "properties": {}
    }
  }));

  let error = classify_entry(&catalog, "Employee").unwrap_err();
  assert!(matches!(error, SchemaError::MalformedSchema(_)), "got {error:?}");
}

#[test]
fn single_table_child_must_not_redeclare_primary_key() {
  let catalog = catalog(json!({
    "Person": parent_schema(),
    "Employee": {
      "x-inherits": true,
      "allOf": [
        {"$ref": "#/components/schemas/Person"},
        {"properties": {"employee_id": {"type": "integer", "x-primary-key": true}}}
      ]
    }
  }));

  let error = classify_entry(&catalog, "Employee").unwrap_err();
  assert!(matches!(error, SchemaError::MalformedSchema(_)), "got {error:?}");
}

#[test]
fn own_tablename_with_parent_foreign_key_is_joined_table() {
  let catalog = catalog(json!({
    "Person": parent_schema(),
    "Employee": {
      "x-inherits": true,
      "x-tablename": "employee",
      "allOf": [
        {"$ref": "#/components/schemas/Person"},
        {
          "properties": {
            "id": {"type": "integer", "x-primary-key": true, "x-foreign-key": "person.id"}
          }
        }
      ]
    }
  }));

  assert_eq!(
    classify_entry(&catalog, "Employee").unwrap(),
    Inheritance::JoinedTable {
      parent: "Person".to_string()
    }
  );
}

#[test]
fn joined_table_without_foreign_key_is_malformed() {
  let catalog = catalog(json!({
    "Person": parent_schema(),
    "Employee": {
      "x-inherits": true,
      "x-tablename": "employee",
      "allOf": [
        {"$ref": "#/components/schemas/Person"},
        {"properties": {"salary": {"type": "number"}}}
      ]
    }
  }));

  let error = classify_entry(&catalog, "Employee").unwrap_err();
  let SchemaError::MalformedSchema(message) = error else {
    panic!("expected MalformedSchema")
  };
  assert!(message.contains("person.id"), "unexpected message: {message}");
}
