use oas3_sqlgen_support::RelationshipKind;
use serde_json::{Value, json};

use super::support::{employee_schema, many_to_many_document};
use crate::generator::{catalog::Catalog, error::SchemaError, orchestrator::Orchestrator, schema::Schema};

fn document_from_schemas(schemas: Value) -> Value {
  json!({"components": {"schemas": schemas}})
}

fn catalog_snapshot(catalog: &Catalog) -> Vec<(String, Schema)> {
  catalog.iter().map(|(name, schema)| (name.clone(), schema.clone())).collect()
}

#[test]
fn document_without_schemas_is_malformed() {
  let error = Orchestrator::new(&json!({"openapi": "3.0.0"})).unwrap_err();
  assert!(matches!(error, SchemaError::MalformedSchema(_)), "got {error:?}");
}

#[test]
fn simple_model_builds_one_table() {
  let document = document_from_schemas(json!({"Employee": employee_schema()}));
  let mut orchestrator = Orchestrator::new(&document).unwrap();

  orchestrator.normalize().unwrap();

  let tables = orchestrator.registry().tables();
  assert_eq!(tables.len(), 1);
  let employee = &tables["employee"];
  let columns: Vec<&str> = employee.columns.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(columns, ["id", "name", "division", "salary"]);
  assert!(employee.columns[0].primary_key);
  assert!(!employee.columns[1].nullable);
  assert!(employee.columns[3].nullable);
  assert!(orchestrator.registry().relationships().is_empty());
}

#[test]
fn many_to_one_places_foreign_key_and_relationship() {
  let document = document_from_schemas(json!({
    "Employee": {
      "type": "object",
      "x-tablename": "employee",
      "properties": {
        "id": {"type": "integer", "x-primary-key": true},
        "division": {"$ref": "#/components/schemas/Division"}
      }
    },
    "Division": {
      "type": "object",
      "x-tablename": "division",
      "properties": {"id": {"type": "integer", "x-primary-key": true}}
    }
  }));
  let mut orchestrator = Orchestrator::new(&document).unwrap();

  orchestrator.normalize().unwrap();

  let employee = orchestrator.catalog().get("Employee").unwrap();
  assert_eq!(
    employee["properties"]["division_id"]["x-foreign-key"],
    json!("division.id")
  );

  let relationship = &orchestrator.registry().relationships()["Employee.division"];
  assert_eq!(relationship.kind, RelationshipKind::ManyToOne);
  assert_eq!(relationship.model_name, "Division");

  let employee_table = &orchestrator.registry().tables()["employee"];
  let columns: Vec<&str> = employee_table.columns.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(columns, ["id", "division_id"]);
  assert_eq!(orchestrator.stats().foreign_keys_placed, 1);
}

#[test]
fn one_to_many_places_foreign_key_on_the_other_side() {
  let document = document_from_schemas(json!({
    "Division": {
      "type": "object",
      "x-tablename": "division",
      "properties": {
        "id": {"type": "integer", "x-primary-key": true},
        "employees": {
          "type": "array",
          "items": {"$ref": "#/components/schemas/Employee"}
        }
      }
    },
    "Employee": {
      "type": "object",
      "x-tablename": "employee",
      "properties": {"id": {"type": "integer", "x-primary-key": true}}
    }
  }));
  let mut orchestrator = Orchestrator::new(&document).unwrap();

  orchestrator.normalize().unwrap();

  let employee = orchestrator.catalog().get("Employee").unwrap();
  assert_eq!(
    employee["properties"]["division_id"]["x-foreign-key"],
    json!("division.id")
  );
  let relationship = &orchestrator.registry().relationships()["Division.employees"];
  assert_eq!(relationship.kind, RelationshipKind::OneToMany);
}

#[test]
fn many_to_many_synthesizes_association() {
  let mut orchestrator = Orchestrator::new(&many_to_many_document()).unwrap();

  orchestrator.normalize().unwrap();

  assert_eq!(orchestrator.associations(), ["employee_project"]);
  let association = orchestrator.catalog().get("employee_project").unwrap();
  let columns: Vec<&String> = association["properties"].as_object().unwrap().keys().collect();
  assert_eq!(columns, ["employee_id", "project_id"]);

  let relationship = &orchestrator.registry().relationships()["Employee.projects"];
  assert_eq!(relationship.kind, RelationshipKind::ManyToMany);
  assert_eq!(relationship.secondary.as_deref(), Some("employee_project"));

  // The association is registered as a table, not a model.
  assert!(orchestrator.registry().associations().contains_key("employee_project"));
  let names: Vec<String> = orchestrator
    .models_document()
    .unwrap()
    .models
    .iter()
    .map(|m| m.name.clone())
    .collect();
  assert_eq!(names, ["Employee", "Project"]);

  // No foreign keys are placed on either side of a many-to-many.
  let employee_table = &orchestrator.registry().tables()["employee"];
  let columns: Vec<&str> = employee_table.columns.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(columns, ["id", "name"]);
}

#[test]
fn normalization_is_idempotent() {
  let mut first = Orchestrator::new(&many_to_many_document()).unwrap();
  first.normalize().unwrap();

  let renormalized_document = document_from_schemas(Value::Object(
    first
      .catalog()
      .iter()
      .map(|(name, schema)| (name.clone(), Value::Object(schema.clone())))
      .collect(),
  ));
  let mut second = Orchestrator::new(&renormalized_document).unwrap();
  second.normalize().unwrap();

  assert_eq!(catalog_snapshot(first.catalog()), catalog_snapshot(second.catalog()));
  assert_eq!(
    first.registry().tables().keys().collect::<Vec<_>>(),
    second.registry().tables().keys().collect::<Vec<_>>()
  );
}

#[test]
fn unresolved_property_reference_aborts_normalization() {
  let document = document_from_schemas(json!({
    "Employee": {
      "type": "object",
      "x-tablename": "employee",
      "properties": {
        "division": {"$ref": "#/components/schemas/Missing"}
      }
    }
  }));
  let mut orchestrator = Orchestrator::new(&document).unwrap();

  let error = orchestrator.normalize().unwrap_err();
  assert_eq!(
    error,
    SchemaError::SchemaNotFound("Missing was not found in schemas.".to_string())
  );
}

#[test]
fn unmanaged_schemas_are_reported_as_warnings() {
  let document = document_from_schemas(json!({
    "Employee": employee_schema(),
    "Payload": {"type": "object"}
  }));
  let mut orchestrator = Orchestrator::new(&document).unwrap();

  orchestrator.normalize().unwrap();

  assert_eq!(orchestrator.stats().warnings.len(), 1);
  let warning = orchestrator.stats().warnings[0].to_string();
  assert!(warning.contains("Payload"), "unexpected warning: {warning}");
}

#[test]
fn check_reports_failing_schemas() {
  let document = document_from_schemas(json!({
    "Employee": employee_schema(),
    "Broken": {"$ref": "#/components/schemas/Gone"}
  }));
  let orchestrator = Orchestrator::new(&document).unwrap();

  let verdicts = orchestrator.check();

  assert_eq!(verdicts.len(), 1);
  assert_eq!(
    verdicts["Broken"].reason.as_deref(),
    Some("reference :: 'Gone was not found in schemas.' ")
  );
}

#[test]
fn composite_constraints_and_kwargs_reach_the_table() {
  let document = document_from_schemas(json!({
    "Employee": {
      "type": "object",
      "x-tablename": "employee",
      "x-composite-unique": [["name", "division"]],
      "x-composite-index": [["name"]],
      "properties": {
        "id": {"type": "integer", "x-primary-key": true},
        "name": {"type": "string", "x-kwargs": {"index": true}},
        "division": {"type": "string"}
      }
    }
  }));
  let mut orchestrator = Orchestrator::new(&document).unwrap();

  orchestrator.normalize().unwrap();

  let employee = &orchestrator.registry().tables()["employee"];
  assert_eq!(employee.composite_unique, Some(json!([["name", "division"]])));
  assert_eq!(employee.composite_index, Some(json!([["name"]])));
  let name = employee.columns.iter().find(|c| c.name == "name").unwrap();
  assert_eq!(
    name.kwargs.as_ref().and_then(|kwargs| kwargs.get("index")),
    Some(&json!(true))
  );
}

#[test]
fn single_table_inheritance_shares_one_table() {
  let document = document_from_schemas(json!({
    "Person": {
      "type": "object",
      "x-tablename": "person",
      "properties": {
        "id": {"type": "integer", "x-primary-key": true},
        "name": {"type": "string"}
      }
    },
    "Employee": {
      "x-inherits": true,
      "allOf": [
        {"$ref": "#/components/schemas/Person"},
        {"properties": {"salary": {"type": "number"}}}
      ]
    }
  }));
  let mut orchestrator = Orchestrator::new(&document).unwrap();

  orchestrator.normalize().unwrap();

  let tables = orchestrator.registry().tables();
  assert_eq!(tables.len(), 1);
  let person = &tables["person"];
  let columns: Vec<&str> = person.columns.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(columns, ["id", "name", "salary"]);

  // Both models are emitted even though they share a table.
  let names: Vec<String> = orchestrator
    .models_document()
    .unwrap()
    .models
    .iter()
    .map(|m| m.name.clone())
    .collect();
  assert_eq!(names, ["Person", "Employee"]);
}
