use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  merge, peek,
  schema::Schema,
};

/// Finds the primary-key property of a flattened schema.
///
/// Returns the property name and its resolved schema, or `None` when no
/// property carries `x-primary-key: true`.
pub(crate) fn primary_key_property(schema: &Schema, catalog: &Catalog) -> Result<Option<(String, Schema)>> {
  let Some(Value::Object(properties)) = schema.get("properties") else {
    return Ok(None);
  };

  for (name, property) in properties {
    let Some(property_schema) = property.as_object() else {
      continue;
    };
    if peek::primary_key(property_schema, catalog)?.unwrap_or(false) {
      let (_, resolved) = merge::prepare(name, property_schema, catalog)?;
      return Ok(Some((name.clone(), resolved)));
    }
  }
  Ok(None)
}

/// The pieces of a foreign-key column synthesized for a relationship.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ForeignKeyColumn {
  /// Name of the column on the owning side.
  pub name: String,
  /// The column schema to insert, carrying `x-foreign-key`.
  pub schema: Schema,
}

/// Builds the foreign-key column schema for a reference to `target`.
///
/// Copies the target primary key's type, format and `maxLength`, and points
/// `x-foreign-key` at `<tablename>.<column>`.
fn build_column(
  column_name: &str,
  target_pk: &Schema,
  target_tablename: &str,
  target_pk_name: &str,
  nullable: bool,
  catalog: &Catalog,
) -> Result<ForeignKeyColumn> {
  let type_ = peek::type_(target_pk, catalog).map_err(|error| match error {
    SchemaError::TypeMissing(_) => {
      SchemaError::malformed("A primary key referenced by a relationship must define a type.")
    }
    other => other,
  })?;

  let mut schema = Schema::new();
  schema.insert("type".to_string(), Value::String(type_));
  if let Some(format) = peek::format(target_pk, catalog)? {
    schema.insert("format".to_string(), Value::String(format));
  }
  if let Some(max_length) = peek::max_length(target_pk, catalog)? {
    schema.insert("maxLength".to_string(), Value::Number(max_length.into()));
  }
  schema.insert("nullable".to_string(), Value::Bool(nullable));
  schema.insert(
    "x-foreign-key".to_string(),
    Value::String(format!("{target_tablename}.{target_pk_name}")),
  );

  Ok(ForeignKeyColumn {
    name: column_name.to_string(),
    schema,
  })
}

/// Places the foreign-key column for a to-one reference.
///
/// For a property `P` on `owner` referring to `target`, adds the column
/// `<P>_<pk>` to `owner`, where `pk` is the target's primary-key name or
/// the `x-foreign-key-column` override. The column is nullable unless the
/// property is required on the owner.
pub(crate) fn place_for_object_ref(
  catalog: &mut Catalog,
  owner_name: &str,
  property_name: &str,
  target_name: &str,
  fk_column: &str,
  required: bool,
) -> Result<()> {
  let target = expect_schema(catalog, target_name)?;
  let (_, target_merged) = merge::prepare(target_name, &target, catalog)?;
  let tablename = expect_tablename(&target_merged, target_name, catalog)?;
  let pk_schema = expect_fk_target(&target_merged, target_name, fk_column, catalog)?;

  let column = build_column(
    &format!("{property_name}_{fk_column}"),
    &pk_schema,
    &tablename,
    fk_column,
    !required,
    catalog,
  )?;
  insert_column(catalog, owner_name, column)
}

/// Places the foreign-key column for a one-to-many reference.
///
/// For an array property on `owner` whose items refer to `target`, adds the
/// column `<owner.tablename>_<owner.pk>` to `target`.
pub(crate) fn place_for_array_ref(
  catalog: &mut Catalog,
  owner_name: &str,
  target_name: &str,
  required: bool,
) -> Result<()> {
  let owner = expect_schema(catalog, owner_name)?;
  let (_, owner_merged) = merge::prepare(owner_name, &owner, catalog)?;
  let tablename = expect_tablename(&owner_merged, owner_name, catalog)?;
  let Some((pk_name, pk_schema)) = primary_key_property(&owner_merged, catalog)? else {
    return Err(SchemaError::malformed(format!(
      "The schema {owner_name} must define a primary key to be referenced by a one-to-many relationship."
    )));
  };

  let column = build_column(
    &format!("{tablename}_{pk_name}"),
    &pk_schema,
    &tablename,
    &pk_name,
    !required,
    catalog,
  )?;
  insert_column(catalog, target_name, column)
}

/// Adds a synthesized column to a schema's properties.
///
/// Re-adding an identical column is a no-op; a name collision with a
/// different definition fails.
fn insert_column(catalog: &mut Catalog, schema_name: &str, column: ForeignKeyColumn) -> Result<()> {
  let schema = catalog
    .get_mut(schema_name)
    .ok_or_else(|| SchemaError::not_found(format!("{schema_name} was not found in schemas.")))?;

  let properties = schema
    .entry("properties")
    .or_insert_with(|| Value::Object(Schema::new()))
    .as_object_mut()
    .ok_or_else(|| SchemaError::malformed("The value of properties must be an object."))?;

  if let Some(existing) = properties.get(&column.name) {
    if existing.as_object() == Some(&column.schema) {
      return Ok(());
    }
    return Err(SchemaError::malformed(format!(
      "The schema {schema_name} already defines a {} property that does not match the foreign key \
       required by a relationship.",
      column.name
    )));
  }

  properties.insert(column.name, Value::Object(column.schema));
  Ok(())
}

fn expect_schema(catalog: &Catalog, name: &str) -> Result<Schema> {
  catalog
    .get(name)
    .cloned()
    .ok_or_else(|| SchemaError::not_found(format!("{name} was not found in schemas.")))
}

fn expect_tablename(merged: &Schema, name: &str, catalog: &Catalog) -> Result<String> {
  peek::tablename(merged, catalog)?.ok_or_else(|| {
    SchemaError::malformed(format!(
      "The schema {name} must set the x-tablename property to participate in a relationship."
    ))
  })
}

/// Resolves the property the foreign key points at on the target schema.
///
/// The column defaults to the primary key; an `x-foreign-key-column`
/// override may name any property.
fn expect_fk_target(merged: &Schema, target_name: &str, fk_column: &str, catalog: &Catalog) -> Result<Schema> {
  let Some(Value::Object(properties)) = merged.get("properties") else {
    return Err(SchemaError::malformed(format!(
      "The schema {target_name} must have properties to be referenced by a relationship."
    )));
  };

  let property = properties.get(fk_column).and_then(Value::as_object).ok_or_else(|| {
    SchemaError::malformed(format!(
      "The schema {target_name} does not define the {fk_column} property referenced by a relationship."
    ))
  })?;
  let (_, resolved) = merge::prepare(fk_column, property, catalog)?;
  Ok(resolved)
}
