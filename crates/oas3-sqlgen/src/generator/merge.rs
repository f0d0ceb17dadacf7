use std::collections::VecDeque;

use serde_json::Value;

use super::{
  catalog::Catalog,
  error::{Result, SchemaError},
  peek, resolver,
  schema::Schema,
};

/// Keys whose values identify the schema; two different non-null values
/// cannot be merged.
const IDENTITY_KEYS: &[&str] = &["type"];

/// Resolves a schema's `$ref` chain and flattens its `allOf` composition.
///
/// This is the standard preparation step before classification and
/// validation; the returned name is the last one seen along the `$ref`
/// chain.
pub fn prepare(name: &str, schema: &Schema, catalog: &Catalog) -> Result<(String, Schema)> {
  let (resolved_name, resolved) = resolver::resolve(name, schema, catalog)?;
  let merged = merge_all_of(&resolved, catalog)?;
  Ok((resolved_name, merged))
}

/// Flattens `allOf` composition by merging child schemas left-to-right.
///
/// Nested `allOf` lists are flattened breadth-first before the fold. The
/// schema's own keys are merged last, so local values override inherited
/// ones. Later children's properties override earlier ones property-by-
/// property, `required` lists union, and other scalar keys are last-wins.
///
/// # Errors
///
/// Returns [`SchemaError::MalformedSchema`] when `allOf` is not a list,
/// when a child is not an object, or when two children disagree on an
/// identity-valued key such as `type`.
pub fn merge_all_of(schema: &Schema, catalog: &Catalog) -> Result<Schema> {
  let Some(all_of) = schema.get("allOf") else {
    return Ok(schema.clone());
  };
  let children = as_all_of_list(all_of)?;

  let mut queue: VecDeque<Value> = children.iter().cloned().collect();
  let mut flattened: Vec<Schema> = Vec::new();
  while let Some(child) = queue.pop_front() {
    let child_schema = child
      .as_object()
      .ok_or_else(|| SchemaError::malformed("The items of allOf must be objects."))?;
    let (_, mut resolved) = resolver::resolve("", child_schema, catalog)?;
    if let Some(nested) = resolved.get("allOf") {
      queue.extend(as_all_of_list(nested)?.iter().cloned());
      resolved.remove("allOf");
    }
    flattened.push(resolved);
  }

  let mut merged = Schema::new();
  for child in &flattened {
    merge_into(&mut merged, child)?;
  }

  let mut own = schema.clone();
  own.remove("allOf");
  merge_into(&mut merged, &own)?;

  Ok(merged)
}

/// Whether the schema produces a table: it has an `x-tablename` after
/// flattening. Schemas that fail to flatten are not constructable.
pub fn is_constructable(schema: &Schema, catalog: &Catalog) -> bool {
  prepare("", schema, catalog)
    .and_then(|(_, merged)| peek::tablename(&merged, catalog))
    .is_ok_and(|tablename| tablename.is_some())
}

fn as_all_of_list(value: &Value) -> Result<&Vec<Value>> {
  value
    .as_array()
    .ok_or_else(|| SchemaError::malformed("The value of allOf must be a list."))
}

fn merge_into(target: &mut Schema, source: &Schema) -> Result<()> {
  for (key, value) in source {
    match key.as_str() {
      "properties" => merge_properties(target, value)?,
      "required" => merge_required(target, value)?,
      key_str if IDENTITY_KEYS.contains(&key_str) => merge_identity(target, key, value)?,
      _ => {
        if !value.is_null() {
          target.insert(key.clone(), value.clone());
        }
      }
    }
  }
  Ok(())
}

fn merge_properties(target: &mut Schema, value: &Value) -> Result<()> {
  let source_properties = value
    .as_object()
    .ok_or_else(|| SchemaError::malformed("The value of properties must be an object."))?;

  let entry = target
    .entry("properties")
    .or_insert_with(|| Value::Object(Schema::new()));
  let target_properties = entry
    .as_object_mut()
    .ok_or_else(|| SchemaError::malformed("The value of properties must be an object."))?;

  for (name, property) in source_properties {
    target_properties.insert(name.clone(), property.clone());
  }
  Ok(())
}

fn merge_required(target: &mut Schema, value: &Value) -> Result<()> {
  let source_required = value
    .as_array()
    .ok_or_else(|| SchemaError::malformed("The value of required must be a list."))?;

  let entry = target.entry("required").or_insert_with(|| Value::Array(Vec::new()));
  let target_required = entry
    .as_array_mut()
    .ok_or_else(|| SchemaError::malformed("The value of required must be a list."))?;

  for name in source_required {
    if !target_required.contains(name) {
      target_required.push(name.clone());
    }
  }
  Ok(())
}

fn merge_identity(target: &mut Schema, key: &str, value: &Value) -> Result<()> {
  if value.is_null() {
    return Ok(());
  }
  if let Some(existing) = target.get(key)
    && !existing.is_null()
    && existing != value
  {
    return Err(SchemaError::malformed(format!(
      "allOf cannot merge conflicting {key} values: {existing} and {value}."
    )));
  }
  target.insert(key.to_string(), value.clone());
  Ok(())
}
