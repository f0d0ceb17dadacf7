use oas3_sqlgen_support::{ColumnDescriptor, ModelRegistry, Table};
use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  merge, peek,
  schema::Schema,
};

/// Artifacts for one column of an association table, read from one side of
/// a many-to-many relationship.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AssociationColumnArtifacts {
  pub type_: String,
  pub format: Option<String>,
  pub max_length: Option<u64>,
  pub tablename: String,
  pub column_name: String,
}

impl AssociationColumnArtifacts {
  /// The synthesized column name, `<tablename>_<pk_name>`.
  fn name(&self) -> String {
    format!("{}_{}", self.tablename, self.column_name)
  }

  /// The foreign key target, `<tablename>.<pk_name>`.
  fn foreign_key(&self) -> String {
    format!("{}.{}", self.tablename, self.column_name)
  }

  /// The catalog schema for the synthesized column.
  fn column_schema(&self) -> Schema {
    let mut schema = Schema::new();
    schema.insert("type".to_string(), Value::String(self.type_.clone()));
    if let Some(format) = &self.format {
      schema.insert("format".to_string(), Value::String(format.clone()));
    }
    if let Some(max_length) = self.max_length {
      schema.insert("maxLength".to_string(), Value::Number(max_length.into()));
    }
    schema.insert("x-foreign-key".to_string(), Value::String(self.foreign_key()));
    schema
  }

  fn descriptor(&self) -> ColumnDescriptor {
    let mut descriptor = ColumnDescriptor::new(self.name(), self.type_.clone());
    descriptor.format = self.format.clone();
    descriptor.max_length = self.max_length;
    descriptor.foreign_key = Some(self.foreign_key());
    descriptor
  }
}

/// Reads the association column artifacts from one side of a many-to-many
/// relationship.
///
/// The side must be an object schema with `x-tablename` and exactly one
/// non-composite primary key.
pub(crate) fn column_artifacts(model_schema: &Schema, catalog: &Catalog) -> Result<AssociationColumnArtifacts> {
  let (_, merged) = merge::prepare("", model_schema, catalog)?;

  let model_type = peek::type_(&merged, catalog).map_err(|error| match error {
    SchemaError::TypeMissing(message) => SchemaError::malformed(message),
    other => other,
  })?;
  if model_type != "object" {
    return Err(SchemaError::malformed(
      "A schema that is part of a many to many relationship must be of type object.",
    ));
  }

  let tablename = peek::tablename(&merged, catalog)?.ok_or_else(|| {
    SchemaError::malformed("A schema that is part of a many to many relationship must set the x-tablename property.")
  })?;

  let properties = merged.get("properties").and_then(Value::as_object).ok_or_else(|| {
    SchemaError::malformed("A schema that is part of a many to many relationship must have properties.")
  })?;
  if properties.is_empty() {
    return Err(SchemaError::malformed(
      "A schema that is part of a many to many relationship must have at least 1 property.",
    ));
  }

  let mut found: Option<AssociationColumnArtifacts> = None;
  for (property_name, property) in properties {
    let Some(property_schema) = property.as_object() else {
      continue;
    };
    if !peek::primary_key(property_schema, catalog)?.unwrap_or(false) {
      continue;
    }
    if found.is_some() {
      return Err(SchemaError::malformed(
        "A schema that is part of a many to many relationship must have exactly 1 primary key.",
      ));
    }

    let type_ = peek::type_(property_schema, catalog).map_err(|error| match error {
      SchemaError::TypeMissing(_) => SchemaError::malformed(
        "A schema that is part of a many to many relationship must define a type for the primary key.",
      ),
      other => other,
    })?;
    found = Some(AssociationColumnArtifacts {
      type_,
      format: peek::format(property_schema, catalog)?,
      max_length: peek::max_length(property_schema, catalog)?,
      tablename: tablename.clone(),
      column_name: property_name.clone(),
    });
  }

  let artifacts = found.ok_or_else(|| {
    SchemaError::malformed("A schema that is part of a many to many relationship must have exactly 1 primary key.")
  })?;
  if matches!(artifacts.type_.as_str(), "object" | "array") {
    return Err(SchemaError::malformed(
      "A schema that is part of a many to many relationship cannot define it's primary key to be of \
       type object nor array.",
    ));
  }

  Ok(artifacts)
}

/// Synthesizes the association table for a many-to-many relationship and
/// adds it to the catalog and the facade registry.
///
/// The catalog entry appears under the association tablename; synthesizing
/// the same association twice is a no-op, while a name collision with a
/// different schema fails.
pub(crate) fn synthesize(
  catalog: &mut Catalog,
  registry: &mut ModelRegistry,
  parent_name: &str,
  child_name: &str,
  tablename: &str,
) -> Result<String> {
  let parent_schema = expect_schema(catalog, parent_name)?;
  let child_schema = expect_schema(catalog, child_name)?;

  let parent_artifacts = column_artifacts(&parent_schema, catalog)?;
  let child_artifacts = column_artifacts(&child_schema, catalog)?;

  let mut properties = Schema::new();
  properties.insert(parent_artifacts.name(), Value::Object(parent_artifacts.column_schema()));
  properties.insert(child_artifacts.name(), Value::Object(child_artifacts.column_schema()));

  let mut association = Schema::new();
  association.insert("type".to_string(), Value::String("object".to_string()));
  association.insert("x-tablename".to_string(), Value::String(tablename.to_string()));
  association.insert("properties".to_string(), Value::Object(properties));

  if let Some(existing) = catalog.get(tablename) {
    if *existing != association {
      return Err(SchemaError::malformed(format!(
        "The association tablename {tablename} is already used by a different schema."
      )));
    }
  } else {
    catalog.insert(tablename, association);
  }

  let table = Table::new(tablename, vec![
    registry.create_column(&parent_artifacts.descriptor())?,
    registry.create_column(&child_artifacts.descriptor())?,
  ]);
  registry.register_association(tablename, table)?;

  Ok(tablename.to_string())
}

fn expect_schema(catalog: &Catalog, name: &str) -> Result<Schema> {
  catalog
    .get(name)
    .cloned()
    .ok_or_else(|| SchemaError::not_found(format!("{name} was not found in schemas.")))
}
