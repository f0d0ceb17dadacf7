use serde_json::{Value, json};

use crate::generator::{catalog::Catalog, schema::Schema};

/// Converts an inline JSON object into a schema mapping.
pub(super) fn schema(value: Value) -> Schema {
  value.as_object().cloned().expect("schema fixtures must be objects")
}

/// Builds a catalog from a mapping of schema names to schemas.
pub(super) fn catalog(value: Value) -> Catalog {
  let mut catalog = Catalog::new();
  for (name, entry) in value.as_object().expect("catalog fixtures must be objects") {
    catalog.insert(name, schema(entry.clone()));
  }
  catalog
}

/// The simple employee model.
pub(super) fn employee_schema() -> Value {
  json!({
    "type": "object",
    "x-tablename": "employee",
    "properties": {
      "id": {"type": "integer", "x-primary-key": true},
      "name": {"type": "string"},
      "division": {"type": "string"},
      "salary": {"type": "number", "nullable": true}
    },
    "required": ["name", "division"]
  })
}

/// A document with employees and projects joined through an association
/// table.
pub(super) fn many_to_many_document() -> Value {
  json!({
    "components": {
      "schemas": {
        "Employee": {
          "type": "object",
          "x-tablename": "employee",
          "properties": {
            "id": {"type": "integer", "x-primary-key": true},
            "name": {"type": "string"},
            "projects": {
              "type": "array",
              "items": {"$ref": "#/components/schemas/Project"},
              "x-secondary": "employee_project"
            }
          }
        },
        "Project": {
          "type": "object",
          "x-tablename": "project",
          "properties": {
            "id": {"type": "integer", "x-primary-key": true},
            "title": {"type": "string"}
          }
        }
      }
    }
  })
}
